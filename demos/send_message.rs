use std::error::Error;

use fleetlink_sdk::downstream::DownstreamMessage;
use fleetlink_sdk::Client;
use secrecy::SecretString;

fn main() -> Result<(), Box<dyn Error>> {
    let token = std::env::var("FLEETLINK_TOKEN")?;
    let mut args = std::env::args().skip(1);
    let collection_id = args.next().expect("usage: send_message <collection> <device>");
    let device_id = args.next().expect("usage: send_message <collection> <device>");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let client = Client::new(SecretString::new(token));

        let message = DownstreamMessage {
            port: 1234,
            payload: b"Hello, device!".to_vec(),
            coap_path: None,
            transport: None,
        };

        match client.send(&collection_id, &device_id, &message).await {
            Ok(()) => println!("message queued for {device_id}"),
            Err(err) => {
                // Unprovisioned devices surface as whatever status the
                // server answers with; branch on it here.
                if let Some(status) = err.status() {
                    println!("server rejected the message: {status}");
                }
                return Err(err.into());
            }
        }

        Ok::<(), Box<dyn Error>>(())
    })
}
