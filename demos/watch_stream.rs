use std::error::Error;

use fleetlink_sdk::stream::session::StreamError;
use fleetlink_sdk::Client;
use secrecy::SecretString;

fn main() -> Result<(), Box<dyn Error>> {
    let token = std::env::var("FLEETLINK_TOKEN")?;
    let collection_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "REPLACE_WITH_COLLECTION_ID".to_string());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let client = Client::new(SecretString::new(token));
        let mut stream = client.collection_stream(&collection_id).await?;

        loop {
            match stream.recv().await {
                Ok(message) => {
                    println!(
                        "device={:?} received={} payload={:?}",
                        message.device.device_id.value(),
                        message.received,
                        String::from_utf8_lossy(&message.payload),
                    );
                }
                Err(StreamError::ServerClosed) => {
                    println!("stream closed by server, reconnect to resume");
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok::<(), Box<dyn Error>>(())
    })
}
