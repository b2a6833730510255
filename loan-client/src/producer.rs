//! Drives parsed requests against the Load Gateway: one at a time, a fixed
//! reply timeout, connection reset on any fault, and a short pace between
//! submissions (spec §4.1). Grounded on `ps/ps.py`'s read-loop shape.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use loan_net::{Envelope, Payload, ReqClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::parser::parse_line;

/// Read `request_file` line by line and submit each request to the Load
/// Gateway at `lg_addr`. Runs until the file is exhausted; never retries a
/// request at this layer (spec §4.1: "CP never retries at its own layer").
pub async fn run_client_producer(
    request_file: &Path,
    lg_addr: SocketAddr,
    reply_timeout: Duration,
    pace: Duration,
) -> anyhow::Result<()> {
    let file = tokio::fs::File::open(request_file).await?;
    let mut lines = BufReader::new(file).lines();
    let mut client = ReqClient::new(lg_addr);

    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let request = match parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(request)) => request,
            Err(e) => {
                warn!(line_no, error = %e, "skipping unparseable request line");
                continue;
            }
        };

        let envelope = Envelope::domain(
            &request.operation,
            Payload {
                book_code: request.book_code.clone(),
                user_id: request.user_id.clone(),
                as_of_date: request.as_of_date,
            },
        );

        match client.call(&envelope, reply_timeout).await {
            Ok(reply) => info!(
                line_no,
                operation = %request.operation,
                ok = reply.ok,
                reason = ?reply.reason,
                "request completed"
            ),
            Err(e) => {
                // `ReqClient::call` already dropped the connection; the next
                // iteration's `call` reconnects before sending.
                warn!(line_no, error = %e, "request failed, moving on");
            }
        }

        tokio::time::sleep(pace).await;
    }

    Ok(())
}
