//! Lists the IDs of all CIs on an omnikeeper server.
//!
//! Expects OMNIKEEPER_URL, OMNIKEEPER_AUTHORITY, OMNIKEEPER_USERNAME and
//! OMNIKEEPER_PASSWORD in the environment.

use tracing_subscriber;

use omnikeeper_client::client::ApiClient;
use omnikeeper_client::error::Error;

pub fn main() {
    tracing_subscriber::fmt::init();

    let client = match ApiClient::from_env() {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    match client.get_all_ciids() {
        Ok(ciids) => {
            for ciid in ciids {
                println!("{}", ciid);
            }
        }
        Err(Error::Api { message, .. }) => {
            eprintln!("Exception when calling getAllCIIDs: {}", message);
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}
