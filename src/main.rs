use std::io;
use std::sync::Arc;
use std::time::Instant;

use fluent::config::Config;
use fluent::node::{some, unless, Conditional, DeferredList, Tag};
use fluent::pool::BufferPool;
use fluent::security::safe_script;
use fluent::text::{static_text, text};
use fluent::{textf, Node, Renderer};

use parking_lot::RwLock;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Shared page data, read by every render.
struct Catalog {
    items: Vec<(String, u64)>,
}

/// Build one request's page. Catalog rows are read at render time.
fn build_page(catalog: &Arc<RwLock<Catalog>>, user: Option<&str>) -> Tag {
    let rows = {
        let catalog = catalog.clone();
        DeferredList::new(move || {
            catalog
                .read()
                .items
                .iter()
                .map(|(name, cents)| {
                    some(
                        Tag::new("li")
                            .attr("data-price", &cents.to_string())
                            .child(some(textf!("{} ({}.{:02})", name, cents / 100, cents % 100))),
                    )
                })
                .collect()
        })
    };

    let greeting = match user {
        Some(name) => Conditional::new(true).then(some(textf!("Welcome back, {}!", name))),
        None => Conditional::new(false).otherwise(some(text("Please sign in"))),
    };

    Tag::new("html").with_size_hint(8 * 1024).child(some(
        Tag::new("body")
            .child(some(Tag::new("h1").child(some(static_text("Catalog")))))
            .child(some(Tag::new("p").child(some(greeting))))
            .child(some(Tag::new("ul").attr("class", "items").child(some(rows))))
            .child(some(unless(
                user.is_some(),
                some(Tag::new("a").attr("href", "/login").text("Sign in")),
            )))
            .child(Some(safe_script("var ready = true;"))),
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration
    let config = Config::parse_args();

    // Initialize tracing
    let log_level = match config.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("fluent v{}", env!("CARGO_PKG_VERSION"));
    let pool_config = config.pool_config();
    info!(
        "Configuration: {} threads x {} renders, {} items, pool={:?}",
        config.threads, config.iterations, config.items, pool_config
    );

    let pool = BufferPool::with_config(pool_config);
    let catalog = Arc::new(RwLock::new(Catalog {
        items: (0..config.items)
            .map(|i| (format!("item <{}>", i), (i as u64 + 1) * 199))
            .collect(),
    }));

    // Reference output, rendered once without the pool
    let unpooled = BufferPool::with_config(fluent::PoolConfig::disabled());
    let expected = Renderer::new(&unpooled).render(&build_page(&catalog, Some("ada")));
    info!("Page size: {} bytes", expected.len());

    let start = Instant::now();
    let total_bytes = std::thread::scope(|s| {
        let handles: Vec<_> = (0..config.threads)
            .map(|_| {
                let pool = &pool;
                let catalog = &catalog;
                let expected = &expected;
                let iterations = config.iterations;
                s.spawn(move || -> io::Result<usize> {
                    let renderer = Renderer::new(pool);
                    let page = build_page(catalog, Some("ada"));
                    let mut sink = io::sink();
                    let mut bytes = 0;
                    for i in 0..iterations {
                        if i % 1000 == 0 {
                            let out = renderer.render(&page);
                            if &out != expected {
                                return Err(io::Error::new(
                                    io::ErrorKind::InvalidData,
                                    "render output diverged",
                                ));
                            }
                        }
                        renderer
                            .render_to(&page, &mut sink)
                            .map_err(|e| io::Error::other(e.to_string()))?;
                        bytes += expected.len();
                    }
                    Ok(bytes)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(io::Error::other("render thread panicked")))
            })
            .sum::<io::Result<usize>>()
    })?;

    let elapsed = start.elapsed();
    let renders = config.threads * config.iterations;
    info!(
        "Rendered {} pages ({} MB) in {:?}: {:.0} renders/sec",
        renders,
        total_bytes / (1024 * 1024),
        elapsed,
        renders as f64 / elapsed.as_secs_f64()
    );

    let stats = pool.stats();
    info!(
        "Pool: hit_rate={:.3} hits={} misses={} returns={} drops={} discards={} idle(small={}, large={})",
        stats.hit_rate(),
        stats.hits,
        stats.misses,
        stats.returns,
        stats.drops,
        stats.discards,
        stats.small,
        stats.large
    );

    // The anonymous variant exercises the other branches once
    let anon = build_page(&catalog, None).render();
    tracing::debug!("Anonymous page: {} bytes", anon.len());

    Ok(())
}
