//! Randomized cleanup cycles checked against the retention rules.

mod common;

use common::{Sandbox, touch_now, write_file};
use gradle_hold::gc::CacheCleaner;
use proptest::prelude::*;

/// What the build does to one entry between `prepare` and `cleanup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Usage {
    Untouched,
    Touched,
    Created,
}

fn usage_strategy() -> impl Strategy<Value = Usage> {
    prop_oneof![
        Just(Usage::Untouched),
        Just(Usage::Touched),
        Just(Usage::Created),
    ]
}

fn module_jar(sandbox: &Sandbox, index: usize) -> std::path::PathBuf {
    sandbox
        .module(&format!("1.{index}"))
        .path()
        .join(format!("h{index}/commons-math3-1.{index}.jar"))
}

fn blob_hash(index: usize) -> String {
    format!("{index:0>32x}")
}

fn tool_version(index: usize) -> String {
    format!("8.{index}")
}

fn version_marker(sandbox: &Sandbox, index: usize) -> std::path::PathBuf {
    sandbox
        .version_cache(&tool_version(index))
        .path()
        .join(common::MARKER)
}

fn wrapper_zip(sandbox: &Sandbox, index: usize) -> std::path::PathBuf {
    let version = tool_version(index);
    sandbox
        .wrapper_dist(&version)
        .path()
        .join(format!("d{index}/gradle-{version}-bin.zip"))
}

fn create_module(sandbox: &Sandbox, index: usize) {
    write_file(&module_jar(sandbox, index), "jar");
}

fn create_blob(sandbox: &Sandbox, index: usize) {
    write_file(sandbox.blob(&blob_hash(index)).path(), "blob");
}

fn create_tool(sandbox: &Sandbox, index: usize) {
    write_file(&version_marker(sandbox, index), "");
    write_file(&wrapper_zip(sandbox, index), "zip");
}

fn cleaner(sandbox: &Sandbox) -> CacheCleaner {
    CacheCleaner::builder()
        .cache_home(sandbox.home().path())
        .staging_dir(sandbox.staging())
        .quiet(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_only_untouched_entries_are_removed(
        modules in prop::collection::vec(usage_strategy(), 1..5),
        blobs in prop::collection::vec(usage_strategy(), 0..5),
        tools in prop::collection::vec(usage_strategy(), 0..4),
    ) {
        let sandbox = Sandbox::new();
        let existing = |usage: &Usage| *usage != Usage::Created;

        for (index, usage) in modules.iter().enumerate() {
            if existing(usage) { create_module(&sandbox, index); }
        }
        for (index, usage) in blobs.iter().enumerate() {
            if existing(usage) { create_blob(&sandbox, index); }
        }
        for (index, usage) in tools.iter().enumerate() {
            if existing(usage) { create_tool(&sandbox, index); }
        }
        sandbox.rewind();

        let cleaner = cleaner(&sandbox);
        cleaner.prepare().unwrap();

        for (index, usage) in modules.iter().enumerate() {
            match usage {
                Usage::Untouched => {}
                Usage::Touched => touch_now(&module_jar(&sandbox, index)),
                Usage::Created => create_module(&sandbox, index),
            }
        }
        for (index, usage) in blobs.iter().enumerate() {
            match usage {
                Usage::Untouched => {}
                Usage::Touched => touch_now(sandbox.blob(&blob_hash(index)).path()),
                Usage::Created => create_blob(&sandbox, index),
            }
        }
        for (index, usage) in tools.iter().enumerate() {
            match usage {
                Usage::Untouched => {}
                Usage::Touched => touch_now(&version_marker(&sandbox, index)),
                Usage::Created => create_tool(&sandbox, index),
            }
        }

        let stats = cleaner.force_cleanup().unwrap();
        prop_assert!(stats.failures.is_empty());

        let untouched = |usages: &[Usage]| usages.iter().filter(|u| **u == Usage::Untouched).count();
        prop_assert_eq!(stats.removed.modules, untouched(&modules[..]));
        prop_assert_eq!(stats.removed.build_cache, untouched(&blobs[..]));
        prop_assert_eq!(stats.removed.versions, untouched(&tools[..]));
        prop_assert_eq!(stats.removed.wrapper_dists, untouched(&tools[..]));

        for (index, usage) in modules.iter().enumerate() {
            let kept = sandbox.module(&format!("1.{index}")).path().exists();
            prop_assert_eq!(kept, *usage != Usage::Untouched, "module {}", index);
        }
        for (index, usage) in blobs.iter().enumerate() {
            let kept = sandbox.blob(&blob_hash(index)).path().exists();
            prop_assert_eq!(kept, *usage != Usage::Untouched, "blob {}", index);
        }
        for (index, usage) in tools.iter().enumerate() {
            let version = tool_version(index);
            let kept = sandbox.version_cache(&version).path().exists();
            let wrapper_kept = sandbox.wrapper_dist(&version).path().exists();
            prop_assert_eq!(kept, *usage != Usage::Untouched, "version {}", version);
            prop_assert_eq!(wrapper_kept, kept, "wrapper for {}", version);
        }

        // The sweep consumes the snapshot.
        let second = cleaner.force_cleanup().unwrap();
        prop_assert!(second.skipped);
    }
}
