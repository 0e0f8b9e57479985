use std::env;

use log::{debug, warn};
use reqauth_core::{Context, OsEnv, Result, Signer};
use reqauth_file_read_tokio::TokioFileRead;
use reqauth_http_send_reqwest::ReqwestHttpSend;
use reqauth_oauth2::{Authenticator, BearerSigner, Config, OAuth2CredentialProvider};

fn init_context() -> Option<Context> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    if env::var("REQAUTH_OAUTH2_TEST").unwrap_or_default() != "on" {
        return None;
    }

    Some(
        Context::new()
            .with_file_read(TokioFileRead)
            .with_http_send(ReqwestHttpSend::default())
            .with_env(OsEnv),
    )
}

#[tokio::test]
async fn test_live_obtain_token() -> Result<()> {
    let Some(ctx) = init_context() else {
        warn!("REQAUTH_OAUTH2_TEST is not set, skipped");
        return Ok(());
    };

    let config = Config::from_env(&ctx)?.load_service_account_key(&ctx).await?;
    let auth = Authenticator::new(ctx, config);

    let mut state = auth.new_state();
    let token = auth.obtain_token(&mut state).await?;
    debug!("got token: {token:?}");

    assert!(!token.access_token.is_empty());
    assert!(!auth.is_access_token_stale(&state));
    Ok(())
}

#[tokio::test]
async fn test_live_sign_request() -> Result<()> {
    let Some(ctx) = init_context() else {
        warn!("REQAUTH_OAUTH2_TEST is not set, skipped");
        return Ok(());
    };

    let config = Config::from_env(&ctx)?.load_service_account_key(&ctx).await?;
    let signer = Signer::new(ctx, OAuth2CredentialProvider::new(config), BearerSigner);

    let mut req = http::Request::builder()
        .uri("https://www.googleapis.com/oauth2/v3/tokeninfo")
        .body(())?
        .into_parts()
        .0;
    signer.sign(&mut req).await?;

    assert!(req.headers.contains_key(http::header::AUTHORIZATION));
    Ok(())
}
