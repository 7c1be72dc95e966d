//! # CFx Bus Benchmarks
//!
//! | Path | Operation |
//! |------|-----------|
//! | Mailbox | push then drain, single thread |
//! | MessageBus | route to one of N registered mailboxes |
//! | Worker | submit through the framework, processed by a module thread |

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cfx_bus::{Mailbox, MessageBus};
use cfx_runtime::config::FrameworkSettings;
use cfx_runtime::{Cfx, ModuleCatalog, ModuleContext};
use cfx_types::{Cbt, ControllerModule, ModuleDescriptor, ModuleError};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

// ============================================================================
// MAILBOX
// ============================================================================

fn bench_mailbox(c: &mut Criterion) {
    let mut group = c.benchmark_group("mailbox");

    for size in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("push_drain", size), &size, |b, &size| {
            let mailbox = Mailbox::new("Sink");
            b.iter(|| {
                for i in 0..size {
                    mailbox.push(Cbt::new("Src", "Sink", "MSG", json!(i)));
                }
                let mut drained = 0;
                while mailbox.try_recv().is_some() {
                    drained += 1;
                }
                black_box(drained)
            })
        });
    }

    group.finish();
}

// ============================================================================
// ROUTING
// ============================================================================

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing");

    for modules in [4usize, 16, 64] {
        let bus = MessageBus::new();
        let names: Vec<String> = (0..modules).map(|i| format!("Module{i}")).collect();
        for name in &names {
            bus.register(Arc::new(Mailbox::new(name.clone()))).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("submit", modules), &names, |b, names| {
            let mut i = 0usize;
            b.iter(|| {
                let recipient = &names[i % names.len()];
                i += 1;
                bus.submit(bus.create("Bench", recipient.as_str(), "MSG", Value::Null))
                    .unwrap();
                if i % 1024 == 0 {
                    for name in names {
                        if let Some(mailbox) = bus.mailbox(name) {
                            while mailbox.try_recv().is_some() {}
                        }
                    }
                }
            })
        });
    }

    group.finish();
}

// ============================================================================
// WORKER
// ============================================================================

struct Counter {
    processed: Arc<AtomicUsize>,
}

impl ControllerModule for Counter {
    fn initialize(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    fn process_cbt(&mut self, _cbt: Cbt) -> Result<(), ModuleError> {
        self.processed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

fn bench_worker_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker");
    group.measurement_time(Duration::from_secs(5));

    let processed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&processed);
    let mut catalog = ModuleCatalog::new();
    catalog.register("Counter", move |_ctx: ModuleContext, _config: &Value| {
        Ok(Counter {
            processed: Arc::clone(&counter),
        })
    });
    let mut cfx = Cfx::with_descriptors(
        FrameworkSettings::default(),
        vec![ModuleDescriptor::new("Counter")],
        catalog,
    );
    cfx.load_all().unwrap();
    cfx.start_all().unwrap();

    group.throughput(Throughput::Elements(100));
    group.bench_function("submit_and_process_100", |b| {
        b.iter(|| {
            let target = processed.load(Ordering::Relaxed) + 100;
            for _ in 0..100 {
                cfx.submit_cbt(cfx.create_cbt("Counter", "MSG", Value::Null))
                    .unwrap();
            }
            while processed.load(Ordering::Relaxed) < target {
                std::hint::spin_loop();
            }
        })
    });

    group.finish();
    cfx.terminate();
}

criterion_group!(
    benches,
    bench_mailbox,
    bench_routing,
    bench_worker_round_trip
);
criterion_main!(benches);
