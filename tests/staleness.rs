//! End-to-end cache invalidation through the orchestrator.

mod support;

use pagedict::{BuildOutcome, Defaults, PageId, RevisionBump};
use support::Engine;

fn engine(pages_per_dict: usize) -> Engine {
    Engine::new(Defaults {
        pages_per_dict,
        ..Defaults::default()
    })
}

/// Bring a set of pages to a state where every one of them is fresh:
/// keep processing until a full sweep reports nothing rebuilt.
fn settle(engine: &Engine, pages: &[PageId]) {
    loop {
        let mut rebuilt = 0;
        for page in pages {
            if matches!(engine.process(page), BuildOutcome::Rebuilt(_)) {
                rebuilt += 1;
            }
        }
        if rebuilt == 0 {
            return;
        }
    }
}

#[test]
fn settled_group_stays_settled() {
    let engine = engine(3);
    let pages: Vec<PageId> = (0..3).map(|i| engine.seed(&format!("scans/{}.tif", i))).collect();
    settle(&engine, &pages);

    let calls = engine.encoder.calls();
    for page in &pages {
        assert_eq!(engine.process(page), BuildOutcome::UpToDate);
    }
    assert_eq!(engine.encoder.calls(), calls);
}

#[test]
fn one_broken_artifact_rebuilds_the_whole_group() {
    let engine = engine(3);
    let pages: Vec<PageId> = (0..3).map(|i| engine.seed(&format!("scans/{}.tif", i))).collect();
    settle(&engine, &pages);

    engine.disk.delete(&engine.artifact_path(&pages[2]));

    // every member shares the dictionary with the broken page
    for page in &pages {
        assert!(engine.invalidator().needs_reprocess(page).unwrap());
    }
    settle(&engine, &pages);
    for page in &pages {
        assert_eq!(engine.process(page), BuildOutcome::UpToDate);
    }
}

#[test]
fn group_staleness_follows_every_member_combination() {
    // exhaustive over which members of a 3-page group have a broken artifact
    for mask in 0u32..8 {
        let engine = engine(3);
        let pages: Vec<PageId> =
            (0..3).map(|i| engine.seed(&format!("scans/{}.tif", i))).collect();
        settle(&engine, &pages);

        for (i, page) in pages.iter().enumerate() {
            if mask & (1 << i) != 0 {
                engine.disk.delete(&engine.artifact_path(page));
            }
        }

        for (i, page) in pages.iter().enumerate() {
            let own_broken = mask & (1 << i) != 0;
            assert_eq!(
                engine.invalidator().is_page_stale(page).unwrap(),
                own_broken,
                "mask {:03b} page {}",
                mask,
                i
            );
            // one broken member poisons the shared dictionary for everyone
            assert_eq!(
                engine.invalidator().needs_reprocess(page).unwrap(),
                mask != 0,
                "mask {:03b} page {}",
                mask,
                i
            );
        }
    }
}

#[test]
fn standalone_pages_do_not_infect_each_other() {
    let engine = engine(1); // sharing disabled
    let a = engine.build("scans/a.tif");
    let b = engine.build("scans/b.tif");

    engine.disk.delete(&engine.artifact_path(&b));

    assert_eq!(engine.process(&a), BuildOutcome::UpToDate);
    assert!(matches!(engine.process(&b), BuildOutcome::Rebuilt(_)));
}

#[test]
fn parameter_change_invalidates_only_that_group() {
    let engine = engine(2);
    let pages: Vec<PageId> = (0..4).map(|i| engine.seed(&format!("scans/{}.tif", i))).collect();
    settle(&engine, &pages);

    let first_group = engine
        .dispatcher()
        .group_for_page(&pages[0])
        .unwrap()
        .unwrap();
    let mut params = engine
        .dispatcher()
        .snapshot_group(&first_group)
        .unwrap()
        .unwrap()
        .params()
        .clone();
    params.aggression -= 10;
    engine
        .dispatcher()
        .set_group_params(&first_group, params)
        .unwrap();

    assert!(matches!(engine.process(&pages[0]), BuildOutcome::Rebuilt(_)));
    assert!(matches!(engine.process(&pages[1]), BuildOutcome::Rebuilt(_)));
    assert_eq!(engine.process(&pages[2]), BuildOutcome::UpToDate);
    assert_eq!(engine.process(&pages[3]), BuildOutcome::UpToDate);
}

#[test]
fn rebalance_invalidates_regrouped_pages() {
    let engine = engine(4);
    let pages: Vec<PageId> = (0..4).map(|i| engine.seed(&format!("scans/{}.tif", i))).collect();
    settle(&engine, &pages);

    engine.dispatcher().rebalance(&pages, 2).unwrap();

    // fresh groups mean fresh revisions; everything rebuilds once
    for page in &pages {
        assert!(matches!(engine.process(page), BuildOutcome::Rebuilt(_)));
    }
    settle(&engine, &pages);
    for page in &pages {
        assert_eq!(engine.process(page), BuildOutcome::UpToDate);
    }
}

#[test]
fn page_joining_a_group_invalidates_existing_members() {
    let engine = engine(3);
    let a = engine.build("scans/a.tif");
    let calls = engine.encoder.calls();

    // a was built against revision r; b's arrival bumps it
    let b = engine.seed("scans/b.tif");
    engine.dispatcher().assign(&b).unwrap();

    assert!(matches!(engine.process(&a), BuildOutcome::Rebuilt(_)));
    assert!(engine.encoder.calls() > calls);
}

#[test]
fn forced_page_rebuilds_even_when_a_sibling_is_checked_first() {
    let engine = engine(2);
    let a = engine.seed("scans/a.tif");
    let b = engine.seed("scans/b.tif");
    settle(&engine, &[a.clone(), b.clone()]);

    engine.store().update(&b, |fp| fp.regen.page = true).unwrap();

    // a's check propagates b's pending rebuild but must not swallow it
    assert!(engine.invalidator().needs_reprocess(&a).unwrap());
    assert!(matches!(engine.process(&b), BuildOutcome::Rebuilt(_)));
}

#[test]
fn suppressed_removal_leaves_siblings_fresh() {
    let engine = engine(3);
    let pages: Vec<PageId> = (0..3).map(|i| engine.seed(&format!("scans/{}.tif", i))).collect();
    settle(&engine, &pages);

    // administrative unmapping, spelled with suppression on purpose
    engine
        .dispatcher()
        .remove(&pages[2], RevisionBump::Suppress)
        .unwrap();
    engine.store().remove(&pages[2]).unwrap();

    assert_eq!(engine.process(&pages[0]), BuildOutcome::UpToDate);
    assert_eq!(engine.process(&pages[1]), BuildOutcome::UpToDate);
}
