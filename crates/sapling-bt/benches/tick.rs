use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sapling_bt::{Builder, Resolve, Status, Tree, TreeConfig};

#[derive(Default)]
struct World {
    ticks: u64,
}

fn bench_reactive_tick(c: &mut Criterion) {
    let mut b = Builder::<World>::new();
    let root = b.reactive_sequence("guards", |b| {
        let mut children = (0..32)
            .map(|i| {
                b.leaf(format!("guard {i}"), |s| {
                    s.on_invalid_check(|_| false);
                })
            })
            .collect::<Vec<_>>();
        children.push(b.leaf("work", |s| {
            s.on_base_tick(|cx| {
                cx.world.ticks += 1;
                Status::Running
            });
        }));
        children
    });
    let root = b.finish(root).expect("valid tree");
    let config = TreeConfig::default().with_restart_on_complete(true);
    let mut tree = Tree::with_config(root, config);
    let mut world = World::default();

    c.bench_function("sapling-bt/tick(conditions=32)", |bench| {
        bench.iter(|| {
            black_box(tree.tick(&mut world));
        })
    });
}

fn bench_yield_switch(c: &mut Criterion) {
    let mut b = Builder::<World>::new();
    let root = b.yield_node("switching", |_, b, _| {
        Resolve::Switch(b.leaf("fresh", |s| {
            s.on_base_tick(|_| Status::Running);
        }))
    });
    let mut tree = Tree::new(b.finish(root).expect("valid tree"));
    let mut world = World::default();

    c.bench_function("sapling-bt/yield(switch every tick)", |bench| {
        bench.iter(|| {
            black_box(tree.tick(&mut world));
        })
    });
}

criterion_group!(benches, bench_reactive_tick, bench_yield_switch);
criterion_main!(benches);
