// benches/patchwork_bench.rs
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use walkdir::WalkDir;

use patchwork::core::{
    ConfigProfile, DescendantIndex, EffectiveExclusions, FsTreeProvider, Node, Tree, TreeProvider,
    folder_state, normalize_path, relative_unix,
};

// ---------- Fixture: synthetic repo tree we reuse across benches ----------
static FS_FIXTURE: Lazy<Fixture> = Lazy::new(|| {
    let tmp = TempDir::new().expect("tmp");
    let root = normalize_path(tmp.path());

    let dirs = &[
        "src", "src/core", "src/ui", "tests", "vendor/dep1", "vendor/dep2", "assets/images",
        "scripts", "src/gen",
    ];
    for d in dirs {
        fs::create_dir_all(root.join(d)).expect("mkdir");
    }

    let files = [
        ("src/lib.rs", "pub mod core;"),
        ("src/core/mod.rs", "mod tree;"),
        ("src/ui/app.rs", "mod ui;"),
        ("tests/engine.rs", "#[test] fn t() {}"),
        ("scripts/build.sh", "#!/usr/bin/env bash\necho hi"),
        ("vendor/dep1/lib.c", "int main(){}"),
        ("vendor/dep2/lib.cpp", "int main(){}"),
        ("README.md", "# readme\n"),
    ];
    for (rel, body) in files {
        write_file(&root.join(rel), body);
    }

    // Many small files spread over nested directories.
    for i in 0..1200 {
        let dir = format!("src/gen/m{:02}/s{}", i % 40, i % 3);
        write_file(&root.join(dir).join(format!("file_{i:04}.rs")), "fn f(){}\n");
    }

    let file_count = WalkDir::new(&root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count();

    let node = FsTreeProvider
        .scan(&root, &ConfigProfile::default())
        .expect("scan fixture");
    let tree = Tree::new(&root, node);

    Fixture {
        _tmp: tmp,
        root,
        tree,
        file_count,
    }
});

struct Fixture {
    _tmp: TempDir, // keep alive
    root: PathBuf,
    tree: Tree,
    file_count: usize,
}

fn write_file(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, body).expect("write");
}

fn dirs_of(n: &Node, out: &mut Vec<Node>) {
    if n.is_dir {
        out.push(n.clone());
        n.children.iter().for_each(|c| dirs_of(c, out));
    }
}

fn exclusions(session: &[&str]) -> EffectiveExclusions {
    let session: BTreeSet<String> = session.iter().map(|s| (*s).to_string()).collect();
    EffectiveExclusions::new(&BTreeSet::from(["vendor".to_string()]), &session)
}

// ---------- Benches ----------

fn bench_scan(c: &mut Criterion) {
    let fx = &*FS_FIXTURE;
    let mut g = c.benchmark_group("scan");
    g.sample_size(30);
    g.measurement_time(Duration::from_secs(5));

    g.bench_with_input(
        BenchmarkId::new("fs_tree_provider", fx.file_count),
        &fx.root,
        |b, root| {
            b.iter(|| black_box(FsTreeProvider.scan(root, &ConfigProfile::default())));
        },
    );
    g.finish();
}

/// Folder states for every directory, as one render pass needs them.
fn bench_folder_states(c: &mut Criterion) {
    let fx = &*FS_FIXTURE;
    let mut dirs = Vec::new();
    dirs_of(fx.tree.root(), &mut dirs);
    let excl = exclusions(&["src/gen/m03"]);
    let selection: BTreeSet<PathBuf> = fx
        .tree
        .descendant_files(fx.tree.root(), &excl)
        .into_iter()
        .step_by(3)
        .collect();

    let mut g = c.benchmark_group("folder_states");
    g.sample_size(30);

    g.bench_function("recursive_walk", |b| {
        b.iter(|| {
            for d in &dirs {
                black_box(folder_state(&fx.tree.descendant_files(d, &excl), &selection));
            }
        });
    });

    let index = DescendantIndex::build(&fx.tree, &excl);
    g.bench_function("memoized_index", |b| {
        b.iter(|| {
            for d in &dirs {
                black_box(folder_state(index.dir_files(&d.path), &selection));
            }
        });
    });

    g.bench_function("index_rebuild", |b| {
        b.iter(|| black_box(DescendantIndex::build(&fx.tree, &excl)));
    });
    g.finish();
}

fn bench_relative_paths(c: &mut Criterion) {
    let fx = &*FS_FIXTURE;
    let files = fx
        .tree
        .descendant_files(fx.tree.root(), &EffectiveExclusions::default());

    c.bench_function("relative_unix", |b| {
        b.iter(|| {
            let mut count = 0usize;
            for p in &files {
                if let Some(rel) = relative_unix(&fx.root, p) {
                    count = count.wrapping_add(rel.len());
                }
            }
            black_box(count)
        });
    });
}

criterion_group!(benches, bench_scan, bench_folder_states, bench_relative_paths);
criterion_main!(benches);
