//! End-to-end properties of the build pipeline.

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

use crease::barrel::manager::BarrelManager;
use crease::document::record::RawRecord;
use crease::document::schema::{FieldSpec, RecordSchema};
use crease::error::Result;
use crease::pipeline::{BuildStage, IndexConfig, IndexPipeline};
use crease::storage::Storage;
use crease::storage::memory::MemoryStorage;

fn config(capacity: u32) -> IndexConfig {
    IndexConfig {
        schema: RecordSchema::new(vec![
            FieldSpec::textual("batsman1_name"),
            FieldSpec::textual("text").required(),
            FieldSpec::passthrough("over"),
        ]),
        barrel_capacity: capacity,
        threads: Some(4),
        ..Default::default()
    }
}

fn text_records(texts: &[&str]) -> Vec<RawRecord> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| RawRecord::new(i as u64).with("text", *text))
        .collect()
}

fn commentary(count: usize) -> Vec<RawRecord> {
    let batsmen = ["Kohli", "Dhoni", "Rohit Sharma", "de Villiers", "Gayle"];
    let outcomes = [
        "no run, defended back to the bowler",
        "FOUR! driven through the covers",
        "SIX, huge hit over long-on",
        "1 run, pushed to mid-wicket",
        "OUT! caught at slip",
        "",
    ];
    (0..count)
        .map(|i| {
            RawRecord::new(i as u64)
                .with("batsman1_name", batsmen[i % batsmen.len()])
                .with("text", outcomes[(i * 7) % outcomes.len()])
                .with("over", format!("{}.{}", i / 6, i % 6 + 1))
        })
        .collect()
}

fn build(records: &[RawRecord], capacity: u32) -> Result<(IndexPipeline, MemoryStorage)> {
    let storage = MemoryStorage::default();
    let mut pipeline = IndexPipeline::new(config(capacity))?;
    pipeline.assemble_documents(records)?;
    pipeline.build_lexicon()?;
    pipeline.build_forward_index()?;
    pipeline.build_inverted_index()?;
    pipeline.persist_into(Arc::new(storage.clone()))?;
    Ok((pipeline, storage))
}

fn read_file(storage: &dyn Storage, name: &str) -> Result<Vec<u8>> {
    let mut input = storage.open_input(name)?;
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    Ok(bytes)
}

#[test]
fn test_four_runs_six_runs_four() -> Result<()> {
    let (pipeline, storage) = build(&text_records(&["four runs", "six runs four"]), 2)?;
    assert_eq!(pipeline.stage(), BuildStage::BarrelsPersisted);

    let lexicon = pipeline.lexicon().unwrap();
    let entries: Vec<_> = lexicon
        .iter()
        .map(|e| (e.term.as_str(), e.term_id, e.doc_frequency))
        .collect();
    assert_eq!(entries, vec![("four", 0, 2), ("runs", 1, 2), ("six", 2, 1)]);

    let forward = pipeline.forward_index().unwrap();
    assert_eq!(forward.get(0).unwrap().postings, vec![(0, 0), (1, 1)]);
    assert_eq!(forward.get(1).unwrap().postings, vec![(2, 0), (1, 1), (0, 2)]);

    let manager = BarrelManager::new(Arc::new(storage), 2)?;
    let barrel0 = manager.load(0)?;
    let barrel1 = manager.load(1)?;
    assert_eq!(
        barrel0.records.iter().map(|r| r.term_id).collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert_eq!(
        barrel1.records.iter().map(|r| r.term_id).collect::<Vec<_>>(),
        vec![2]
    );
    assert!(manager.load(2).is_err());

    let four = manager.postings(0)?;
    assert_eq!(
        four.iter().map(|p| (p.doc_id, p.positions.clone())).collect::<Vec<_>>(),
        vec![(0, vec![0]), (1, vec![2])]
    );

    Ok(())
}

#[test]
fn test_builds_are_idempotent() -> Result<()> {
    let records = commentary(300);
    let (_, first) = build(&records, 7)?;
    let (_, second) = build(&records, 7)?;

    let files = first.list_files()?;
    assert_eq!(files, second.list_files()?);
    for name in files.iter().filter(|name| name.as_str() != "manifest.json") {
        assert_eq!(
            read_file(&first, name)?,
            read_file(&second, name)?,
            "{name} differs between builds"
        );
    }

    Ok(())
}

#[test]
fn test_forward_and_inverted_hold_the_same_occurrences() -> Result<()> {
    let (pipeline, _) = build(&commentary(250), 5)?;
    let forward = pipeline.forward_index().unwrap();
    let inverted = pipeline.inverted_index().unwrap();

    let mut from_forward: Vec<(u64, u32, u32)> = forward
        .records()
        .iter()
        .flat_map(|r| r.postings.iter().map(move |&(t, p)| (r.doc_id, t, p)))
        .collect();
    let mut from_inverted: Vec<(u64, u32, u32)> = inverted
        .records()
        .iter()
        .flat_map(|r| {
            r.postings.iter().flat_map(move |posting| {
                posting
                    .positions
                    .iter()
                    .map(move |&p| (posting.doc_id, r.term_id, p))
            })
        })
        .collect();

    from_forward.sort_unstable();
    from_inverted.sort_unstable();
    assert_eq!(from_forward, from_inverted);

    Ok(())
}

#[test]
fn test_doc_frequency_counts_documents() -> Result<()> {
    let (pipeline, _) = build(&commentary(120), 4)?;
    let lexicon = pipeline.lexicon().unwrap();

    for entry in lexicon.iter() {
        let containing = pipeline
            .documents()
            .iter()
            .filter(|doc| doc.terms.iter().any(|t| t == &entry.term))
            .count();
        assert_eq!(entry.doc_frequency as usize, containing, "term `{}`", entry.term);
    }

    Ok(())
}

#[test]
fn test_positions_rebuild_every_document() -> Result<()> {
    let (pipeline, storage) = build(&commentary(90), 3)?;
    let lexicon = pipeline.lexicon().unwrap();
    let manager = BarrelManager::new(Arc::new(storage), 3)?;

    let mut rebuilt: BTreeMap<u64, BTreeMap<u32, String>> = BTreeMap::new();
    for barrel_id in 0..pipeline.report().barrel_count {
        for record in manager.load(barrel_id)?.records {
            let term = &lexicon.entry(record.term_id).unwrap().term;
            for posting in record.postings {
                for position in posting.positions {
                    rebuilt
                        .entry(posting.doc_id)
                        .or_default()
                        .insert(position, term.clone());
                }
            }
        }
    }

    for doc in pipeline.documents() {
        let terms: Vec<String> = rebuilt
            .remove(&doc.id)
            .unwrap_or_default()
            .into_values()
            .collect();
        assert_eq!(terms, doc.terms, "document {}", doc.id);
    }
    assert!(rebuilt.is_empty());

    Ok(())
}

#[test]
fn test_barrels_cover_every_term_once() -> Result<()> {
    for capacity in [1, 2, 3, 10, 10_000] {
        let (pipeline, storage) = build(&commentary(60), capacity)?;
        let term_count = pipeline.lexicon().unwrap().len() as u32;
        let manager = BarrelManager::new(Arc::new(storage), capacity)?;

        let mut covered = Vec::new();
        for barrel_id in 0..pipeline.report().barrel_count {
            let barrel = manager.load(barrel_id)?;
            for record in &barrel.records {
                assert_eq!(record.term_id / capacity, barrel_id);
            }
            covered.extend(barrel.records.iter().map(|r| r.term_id));
        }

        assert_eq!(covered, (0..term_count).collect::<Vec<_>>(), "capacity {capacity}");
        assert_eq!(
            pipeline.report().barrel_count,
            term_count.div_ceil(capacity)
        );
    }

    Ok(())
}

#[test]
fn test_empty_and_blank_records() -> Result<()> {
    let records = vec![
        RawRecord::new(0).with("text", ""),
        RawRecord::new(1).with("text", "   ...   "),
        RawRecord::new(2).with_null("text"),
    ];
    let (pipeline, storage) = build(&records, 4)?;

    assert_eq!(pipeline.documents().len(), 3);
    assert!(pipeline.documents().iter().all(|doc| doc.terms.is_empty()));
    assert!(pipeline.lexicon().unwrap().is_empty());
    assert_eq!(pipeline.report().barrel_count, 0);
    assert!(storage.file_exists("manifest.json"));

    Ok(())
}

#[test]
fn test_skipped_records_leave_id_gaps() -> Result<()> {
    let records = vec![
        RawRecord::new(0).with("text", "four runs"),
        RawRecord::new(1).with("over", "0.2"),
        RawRecord::new(2).with("text", "six"),
    ];
    let (pipeline, _) = build(&records, 4)?;

    let ids: Vec<u64> = pipeline.documents().iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![0, 2]);
    assert_eq!(pipeline.report().skipped.len(), 1);
    assert_eq!(pipeline.report().skipped[0].index, 1);
    assert_eq!(pipeline.lexicon().unwrap().doc_count(), 2);

    Ok(())
}
