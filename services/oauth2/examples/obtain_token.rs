use std::env;
use std::process::exit;

use anyhow::Result;
use log::debug;
use reqauth_core::{Context, OsEnv};
use reqauth_file_read_tokio::TokioFileRead;
use reqauth_http_send_reqwest::ReqwestHttpSend;
use reqauth_oauth2::{Authenticator, Config, Token, TokenObserver};

#[derive(Debug)]
struct PrintRefreshToken;

impl TokenObserver for PrintRefreshToken {
    fn on_tokens_obtained(&self, token: &Token) {
        if let Some(refresh_token) = &token.refresh_token {
            println!("refresh token: {refresh_token}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    // usage: obtain_token authorize | exchange <code> | token
    let args: Vec<_> = env::args().collect();
    if args.len() < 2 {
        println!("command is missing");
        exit(1)
    }

    let ctx = Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv);
    let config = Config::from_env(&ctx)?
        .load_service_account_key(&ctx)
        .await?;
    let auth = Authenticator::new(ctx, config).with_observer(PrintRefreshToken);
    let mut state = auth.new_state();

    match args[1].as_str() {
        "authorize" => println!("{}", auth.authorization_url(None)?),
        "exchange" => {
            let Some(code) = args.get(2) else {
                println!("code is missing");
                exit(1)
            };
            auth.fetch_access_and_refresh_tokens(&mut state, code)
                .await?;
        }
        "token" => {
            let header = auth.authorization_header(&mut state).await?;
            debug!("authorization header: {header:?}");
        }
        v => {
            println!("unknown command {v}");
            exit(1)
        }
    }

    debug!("credential state: {state:?}");
    Ok(())
}
