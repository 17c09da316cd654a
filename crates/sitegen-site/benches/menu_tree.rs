//! Benchmarks for menu tree operations.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sitegen_site::{MenuRenderer, MenuTree, RouteTable};
use sitegen_store::{MenuNode, Structure};

/// Create a structure with specified depth and breadth below the root.
fn create_structure(depth: usize, breadth: usize) -> Structure {
    let mut menus = vec![MenuNode::new(Some(1), "Home", None)];
    let mut level = vec!["Home".to_owned()];

    for d in 0..depth {
        let mut next = Vec::with_capacity(level.len() * breadth);
        for parent in &level {
            for b in 0..breadth {
                let title = format!("{parent} {d}-{b}");
                let id = menus.len() as u64 + 1;
                menus.push(MenuNode::new(Some(id), title.as_str(), Some(parent.as_str())));
                next.push(title);
            }
        }
        level = next;
    }

    Structure {
        menus,
        ..Structure::default()
    }
}

fn bench_tree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_build");

    for (depth, breadth) in [(2, 10), (3, 5), (5, 3)] {
        let structure = create_structure(depth, breadth);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{depth}x{breadth}")),
            &structure,
            |b, s| b.iter(|| MenuTree::build(s).unwrap()),
        );
    }

    group.finish();
}

fn bench_path_resolution(c: &mut Criterion) {
    let tree = MenuTree::build(&create_structure(5, 3)).unwrap();
    let deepest = *tree.preorder().last().unwrap();

    let mut group = c.benchmark_group("path_of");

    group.bench_function("depth_1", |b| {
        b.iter(|| tree.path_of(tree.children(tree.root())[0]));
    });

    group.bench_function("depth_5", |b| b.iter(|| tree.path_of(deepest)));

    group.bench_function("route_table", |b| b.iter(|| RouteTable::from_tree(&tree)));

    group.finish();
}

fn bench_menu_render(c: &mut Criterion) {
    let tree = MenuTree::build(&create_structure(3, 5)).unwrap();

    c.bench_function("menu_render", |b| {
        b.iter(|| MenuRenderer::new(&tree).with_active("2").render());
    });
}

criterion_group!(
    benches,
    bench_tree_build,
    bench_path_resolution,
    bench_menu_render
);
criterion_main!(benches);
