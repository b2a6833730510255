use clap::Parser;
use loan_actors::EventActor;
use loan_config::{CommonArgs, Endpoints, Timeouts};
use loan_net::envelope::{OP_DEVOLUCION, OP_RENOVACION};
use tracing::info;

#[derive(Clone, Copy, clap::ValueEnum)]
enum EventKind {
    Devolucion,
    Renovacion,
}

#[derive(Parser)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
    /// Which event stream this actor instance applies.
    #[arg(long, value_enum)]
    kind: EventKind,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let endpoints = Endpoints::from_env();
    let timeouts = Timeouts::default();

    let (topic, operation) = match args.kind {
        EventKind::Devolucion => (loan_config::TOPIC_DEVOLUCION, OP_DEVOLUCION),
        EventKind::Renovacion => (loan_config::TOPIC_RENOVACION, OP_RENOVACION),
    };
    let actor = EventActor::new(topic, operation);

    let subscriber_addr = endpoints.lg_pub(args.common.site);
    let se_addr = endpoints.se_reqrep(args.common.site);
    info!(
        site = args.common.site.as_u8(),
        operation,
        %subscriber_addr,
        "event actor starting"
    );

    actor
        .run(subscriber_addr, se_addr, timeouts.la_to_se, timeouts.event_actor_retry_sleep)
        .await;
    Ok(())
}
