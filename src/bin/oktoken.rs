use tracing::debug;
use tracing_subscriber;

use omnikeeper_client::token::TokenManager;

pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let tm = TokenManager::from_env()?;

    let token = tm.token()?;
    debug!("Token expiry: {:?}", token.expiry);
    println!("AccessToken: {}", token.access_token);

    Ok(())
}
