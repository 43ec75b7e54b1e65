//! Document store: stored fields and snippets, keyed by doc id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{CreaseError, Result};
use crate::storage::Storage;
use crate::storage::structured::{read_artifact, write_artifact};

/// Artifact file name.
pub const DOCUMENTS_FILE: &str = "documents.dat";

const MAGIC: &[u8; 4] = b"CRDS";
const VERSION: u32 = 1;

/// What the index keeps about one document for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub doc_id: u64,
    /// Number of term occurrences.
    pub term_count: u32,
    pub fields: BTreeMap<String, String>,
    pub snippet: String,
}

impl From<&Document> for StoredDocument {
    fn from(doc: &Document) -> Self {
        StoredDocument {
            doc_id: doc.id,
            term_count: doc.terms.len() as u32,
            fields: doc.stored.clone(),
            snippet: doc.snippet.clone(),
        }
    }
}

/// All stored documents of a build, ordered by doc id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStore {
    documents: BTreeMap<u64, StoredDocument>,
}

impl DocumentStore {
    pub fn from_documents(documents: &[Document]) -> Self {
        DocumentStore {
            documents: documents
                .iter()
                .map(|doc| (doc.id, StoredDocument::from(doc)))
                .collect(),
        }
    }

    pub fn get(&self, doc_id: u64) -> Option<&StoredDocument> {
        self.documents.get(&doc_id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredDocument> {
        self.documents.values()
    }

    /// Write `documents.dat` atomically.
    pub fn save(&self, storage: &dyn Storage) -> Result<u64> {
        write_artifact(storage, DOCUMENTS_FILE, MAGIC, VERSION, |writer| {
            writer.write_varint(self.documents.len() as u64)?;

            let mut previous = 0u64;
            for doc in self.documents.values() {
                // Ids ascend, so the delta never underflows.
                writer.write_varint(doc.doc_id - previous)?;
                previous = doc.doc_id;

                writer.write_varint(doc.term_count as u64)?;
                writer.write_varint(doc.fields.len() as u64)?;
                for (name, value) in &doc.fields {
                    writer.write_string(name)?;
                    writer.write_string(value)?;
                }
                writer.write_string(&doc.snippet)?;
            }
            Ok(())
        })
    }

    /// Read `documents.dat`.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        read_artifact(storage, DOCUMENTS_FILE, MAGIC, VERSION, |reader| {
            let count = reader.read_length()?;
            let mut documents = BTreeMap::new();

            let mut doc_id = 0u64;
            for i in 0..count {
                let delta = reader.read_varint()?;
                if i > 0 && delta == 0 {
                    return Err(CreaseError::serialization(format!(
                        "Duplicate doc id {doc_id} in document store"
                    )));
                }
                doc_id = doc_id
                    .checked_add(delta)
                    .ok_or_else(|| CreaseError::serialization("Doc id overflow"))?;

                let term_count = reader.read_varint_u32()?;
                let field_count = reader.read_length()?;
                let mut fields = BTreeMap::new();
                for _ in 0..field_count {
                    let name = reader.read_string()?;
                    let value = reader.read_string()?;
                    fields.insert(name, value);
                }
                let snippet = reader.read_string()?;

                documents.insert(
                    doc_id,
                    StoredDocument {
                        doc_id,
                        term_count,
                        fields,
                        snippet,
                    },
                );
            }

            Ok(DocumentStore { documents })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn document(id: u64, over: &str, text: &str) -> Document {
        Document {
            id,
            fields: vec![text.to_string()],
            terms: crate::analysis::normalize(text),
            stored: BTreeMap::from([("over".to_string(), over.to_string())]),
            snippet: text.to_string(),
        }
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::default();
        let store = DocumentStore::from_documents(&[
            document(0, "0.1", "four runs"),
            document(2, "0.3", "six runs four"),
        ]);

        store.save(&storage).unwrap();
        let loaded = DocumentStore::load(&storage).unwrap();

        assert_eq!(loaded, store);
        assert_eq!(loaded.len(), 2);
        let doc = loaded.get(2).unwrap();
        assert_eq!(doc.term_count, 3);
        assert_eq!(doc.fields["over"], "0.3");
        assert_eq!(doc.snippet, "six runs four");
        assert!(loaded.get(1).is_none());
    }

    #[test]
    fn test_empty_store() {
        let storage = MemoryStorage::default();
        DocumentStore::default().save(&storage).unwrap();
        assert!(DocumentStore::load(&storage).unwrap().is_empty());
    }
}
