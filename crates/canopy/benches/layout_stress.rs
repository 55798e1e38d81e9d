use canopy::{LayoutStrategy, NodeKey, ScrollTarget, Size, TreeLayout, TreeOptions};
use serde_json::{Value, json};
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

/// Balanced tree with `fanout^depth` leaves; keys number the nodes in pre-order.
fn balanced_tree(fanout: usize, depth: usize) -> Value {
    fn build(next: &mut i64, fanout: usize, depth: usize) -> Value {
        let key = *next;
        *next += 1;
        if depth == 0 {
            return json!({ "key": key });
        }
        let children: Vec<Value> = (0..fanout).map(|_| build(next, fanout, depth - 1)).collect();
        json!({ "key": key, "children": children })
    }
    let mut next = 0;
    build(&mut next, fanout, depth)
}

fn expand_all(strategy: LayoutStrategy) -> TreeOptions {
    TreeOptions {
        default_expand_all: true,
        layout_strategy: strategy,
        ..Default::default()
    }
}

fn bench_layout_stress(c: &mut Criterion) {
    // 5^6 leaves, about 19.5k nodes.
    let data = balanced_tree(5, 6);

    let mut group = c.benchmark_group("layout_stress");
    group.sample_size(20);

    for strategy in [LayoutStrategy::TopCenter, LayoutStrategy::TopLeftAlignLeft] {
        group.bench_function(format!("initialize_balanced_5x6_{strategy}"), |b| {
            b.iter(|| {
                let mut layout = TreeLayout::new(expand_all(strategy));
                layout.initialize(black_box(&data)).expect("valid tree");
                black_box(layout.visible_nodes(false).len());
            });
        });
    }

    let mut layout = TreeLayout::new(expand_all(LayoutStrategy::TopCenter));
    layout.initialize(&data).expect("valid tree");
    let first_child = NodeKey::Int(1);
    group.bench_function("toggle_subtree_x2", |b| {
        b.iter(|| {
            layout.toggle_expanded(black_box(&first_child));
            layout.toggle_expanded(black_box(&first_child));
        });
    });

    // Frame rendering is what a host calls at display rate, so batch to get a stable signal.
    let mut layout = TreeLayout::new(expand_all(LayoutStrategy::CenterLeft));
    layout.initialize(&data).expect("valid tree");
    layout.toggle_expanded(&first_child);
    layout.set_viewport(Size::new(1920.0, 1080.0));
    layout.scroll_into_view(&ScrollTarget::new(NodeKey::Int(0)));
    let keys: Vec<NodeKey> = layout
        .visible_nodes(true)
        .into_iter()
        .map(|n| n.key.clone())
        .collect();
    group.bench_function("animation_render_frame_x10", |b| {
        b.iter(|| {
            let mut acc = 0usize;
            for step in 0..10 {
                let progress = f64::from(step) / 10.0;
                for key in &keys {
                    let frame = layout.animation_render(key, black_box(progress));
                    acc += usize::from(frame.node.is_some());
                }
            }
            black_box(acc);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_layout_stress);
criterion_main!(benches);
