use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use passkey_verify::{
    AAGUID_URL, AaguidRegistry, AuthnPublicKeyCredential, aaguid_registry,
    fetch_aaguid_registry, get_public_key, verify_rp_id_hash, verify_signature,
};

const USAGE: &str = "Usage: demo-verify <credential.json> [<registration.json>]

  credential.json    PublicKeyCredential.toJSON() output from the browser
  registration.json  registration response whose public key verifies an assertion

Environment:
  PASSKEY_RP_ID         relying party ID checked against rpIdHash (default: localhost)
  PASSKEY_FETCH_AAGUID  set to true to merge the online AAGUID dataset";

#[derive(Serialize)]
struct Summary {
    id: String,
    ceremony: &'static str,
    origin: String,
    challenge: String,
    rp_id: String,
    rp_id_hash_ok: bool,
    user_present: bool,
    user_verified: bool,
    backed_up: bool,
    sign_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    aaguid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authenticator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature_valid: Option<bool>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=info,passkey_verify=info", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_credential(path: &str) -> Result<AuthnPublicKeyCredential, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(AuthnPublicKeyCredential::from_json_str(&json)?)
}

async fn registry() -> AaguidRegistry {
    let bundled = aaguid_registry().clone();
    let fetch = std::env::var("PASSKEY_FETCH_AAGUID")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if !fetch {
        return bundled;
    }

    match fetch_aaguid_registry(AAGUID_URL).await {
        Ok(online) => bundled.extend(&online),
        Err(e) => {
            tracing::warn!("Using bundled AAGUID dataset only: {}", e);
            bundled
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(credential_path) = args.first() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let rp_id = std::env::var("PASSKEY_RP_ID").unwrap_or_else(|_| "localhost".to_string());
    let credential = load_credential(credential_path)?;
    let auth_data = credential.auth_data()?;
    let client_data = credential.client_data();

    let mut summary = Summary {
        id: credential.id().to_string(),
        ceremony: client_data.type_.as_str(),
        origin: client_data.origin.clone(),
        challenge: client_data.challenge.clone(),
        rp_id_hash_ok: verify_rp_id_hash(&credential, &rp_id),
        rp_id,
        user_present: auth_data.is_user_present(),
        user_verified: auth_data.is_user_verified(),
        backed_up: auth_data.is_backed_up(),
        sign_count: auth_data.sign_count,
        aaguid: None,
        authenticator: None,
        signature_valid: None,
    };

    match &credential {
        AuthnPublicKeyCredential::Attestation(registration) => {
            let registry = registry().await;
            if let Some(attested) = &auth_data.attested_credential_data {
                summary.aaguid = Some(attested.aaguid_string());
            }
            summary.authenticator = Some(
                registry
                    .get(registration)
                    .cloned()
                    .unwrap_or_default()
                    .name,
            );
            let key = get_public_key(registration)?;
            tracing::info!("Credential public key uses {}", key.algorithm().name());
        }
        AuthnPublicKeyCredential::Assertion(assertion) => match args.get(1) {
            Some(registration_path) => {
                let registration = load_credential(registration_path)?;
                let Some(registration) = registration.as_attestation() else {
                    return Err(
                        format!("{registration_path} is not a registration response").into(),
                    );
                };
                let key = get_public_key(registration)?;
                summary.signature_valid = Some(verify_signature(assertion, &key)?);
            }
            None => tracing::info!("No registration response given, skipping signature check"),
        },
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
