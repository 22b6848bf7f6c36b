//! Benchmarks for navigation cache compilation.

use std::path::PathBuf;
use std::sync::Arc;

use arbor_cache::FileCache;
use arbor_pages::{NavigationBuilder, NavigationCache, compile, load_forest};
use arbor_storage::{
    FileSystem, FsGateway, Language, MemoryStore, MetaId, NewMeta, NewPage, PageId, PageStatus,
    PageStore, TemplateId, UserId, Zone,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

fn page(id: u32, parent: u32, sequence: i64, meta_id: MetaId, language: &Language) -> NewPage {
    NewPage {
        id: PageId(id),
        language: language.clone(),
        user_id: UserId(1),
        template_id: TemplateId(1),
        meta_id,
        parent_id: PageId(parent),
        sequence,
        zone: Zone::Page,
        status: PageStatus::Active,
        title: format!("Page {id}"),
        navigation_title: format!("Page {id}"),
        hidden: false,
        has_extra: false,
        allow_move: true,
        allow_edit: true,
        allow_delete: true,
        allow_children: true,
        created_on: 0,
        edited_on: 0,
        publish_on: 0,
    }
}

/// Create a tree below home with specified depth and breadth.
fn create_tree(depth: usize, breadth: usize) -> MemoryStore {
    fn create_level(
        store: &MemoryStore,
        language: &Language,
        parent: u32,
        next_id: &mut u32,
        current_depth: usize,
        max_depth: usize,
        breadth: usize,
    ) {
        if current_depth > max_depth {
            return;
        }
        for i in 0..breadth {
            let id = *next_id;
            *next_id += 1;
            let meta_id = store
                .insert_meta(NewMeta {
                    url: format!("section-{i}"),
                    ..Default::default()
                })
                .unwrap();
            let sequence = i64::try_from(i).unwrap() + 1;
            store.insert_page(page(id, parent, sequence, meta_id, language)).unwrap();
            create_level(store, language, id, next_id, current_depth + 1, max_depth, breadth);
        }
    }

    let store = MemoryStore::new();
    let language = Language::new("en").unwrap();
    let home_meta = store
        .insert_meta(NewMeta {
            url: "home".to_owned(),
            ..Default::default()
        })
        .unwrap();
    store.insert_page(page(1, 0, 1, home_meta, &language)).unwrap();
    let mut next_id = 1001;
    create_level(&store, &language, 1, &mut next_id, 1, depth, breadth);
    store
}

fn bench_compile(c: &mut Criterion) {
    let language = Language::new("en").unwrap();
    let mut group = c.benchmark_group("compile_by_size");

    for (depth, breadth) in [(2, 5), (3, 8), (4, 6)] {
        let store = create_tree(depth, breadth);
        let forest = load_forest(&store, &[PageId::ROOT], &language).unwrap();

        group.throughput(Throughput::Elements(forest.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("pages", format!("{depth}d_{breadth}b")),
            &forest,
            |b, forest| b.iter(|| compile(forest)),
        );
    }

    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let temp_dir = tempfile::tempdir().unwrap();
    let language = Language::new("en").unwrap();
    let store = create_tree(3, 8);
    let cache = FileCache::new(
        Arc::new(FsGateway::new()) as Arc<dyn FileSystem>,
        temp_dir.path().join("cache"),
        "bench",
    );
    let builder = NavigationBuilder::new(&store, &cache);

    c.bench_function("rebuild_3d_8b", |b| {
        b.iter(|| builder.rebuild(&language).unwrap());
    });
}

fn bench_lookup(c: &mut Criterion) {
    let temp_dir = tempfile::tempdir().unwrap();
    let language = Language::new("en").unwrap();
    let store = create_tree(3, 8);
    let cache = FileCache::new(
        Arc::new(FsGateway::new()) as Arc<dyn FileSystem>,
        PathBuf::from(temp_dir.path()).join("cache"),
        "bench",
    );
    NavigationBuilder::new(&store, &cache).rebuild(&language).unwrap();

    let mut group = c.benchmark_group("navigation_lookup");

    group.bench_function("load", |b| {
        b.iter(|| NavigationCache::load(&cache, &language).unwrap());
    });

    let navigation = NavigationCache::load(&cache, &language).unwrap().unwrap();
    group.bench_function("full_url_hit", |b| {
        b.iter(|| navigation.full_url(PageId(1010)).unwrap().len());
    });
    group.bench_function("menu_full_depth", |b| {
        b.iter(|| navigation.menu(Zone::Page, PageId::HOME, None));
    });

    group.finish();
}

criterion_group!(benches, bench_compile, bench_rebuild, bench_lookup);
criterion_main!(benches);
