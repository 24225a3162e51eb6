use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_tree::HierarchicalLayer;

const DEFAULT_DIRECTIVES: &str = "tessera=info";

/// Installs the global subscriber: an `EnvFilter` read from `RUST_LOG`
/// (falling back to `tessera=info`) in front of an indented span tree.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_DIRECTIVES.to_owned());
    init_with_directives(&directives);
}

pub fn init_with_directives(directives: &str) {
    let filter = EnvFilter::builder().parse_lossy(directives);
    let tree = HierarchicalLayer::new(2)
        .with_indent_lines(true)
        .with_targets(true)
        .with_bracketed_fields(true);
    _ = tracing_subscriber::registry().with(filter).with(tree).try_init();
}
