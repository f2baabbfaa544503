//! Ranked query execution with pagination.
//!
//! Queries return entity ids ordered by BM25 relevance plus the exact
//! total match count, so callers can paginate and then reconstruct full
//! records from the primary store in ranking order.

use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, Occur, QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{Index, IndexReader, Term};
use tracing::{debug, info};

use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::schema::SearchSchema;

/// One page of ranked query results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPage {
    /// Entity ids, most relevant first
    pub ids: Vec<String>,
    /// Total matches across all pages
    pub total: usize,
}

impl QueryPage {
    /// The canonical "no matches" result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True if this page carries no ids.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Executes ranked queries against the entity index.
pub struct EntitySearcher {
    index: Index,
    reader: IndexReader,
    schema: SearchSchema,
}

impl EntitySearcher {
    /// Create a new searcher from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        let reader = index.reader()?;
        let schema = index.schema().clone();

        Ok(Self {
            index: index.index().clone(),
            reader,
            schema,
        })
    }

    /// Reload the reader to see recent commits.
    pub fn reload(&self) -> Result<(), SearchError> {
        self.reader.reload()?;
        debug!("Reloaded search reader");
        Ok(())
    }

    /// Run a ranked query over one collection.
    ///
    /// Pagination is 1-indexed. A page past the available results returns
    /// an empty id list with the correct total. An empty or whitespace
    /// expression matches nothing.
    pub fn query(
        &self,
        collection: &str,
        expression: &str,
        page: usize,
        per_page: usize,
    ) -> Result<QueryPage, SearchError> {
        if expression.trim().is_empty() || per_page == 0 {
            return Ok(QueryPage::empty());
        }

        let searcher = self.reader.searcher();

        let parser = QueryParser::for_index(&self.index, vec![self.schema.text]);
        let text_query = parser.parse_query(expression)?;

        let collection_term = Term::from_field_text(self.schema.collection, collection);
        let collection_query = TermQuery::new(collection_term, IndexRecordOption::Basic);

        let query = BooleanQuery::new(vec![
            (Occur::Must, text_query),
            (Occur::Must, Box::new(collection_query)),
        ]);

        let page = page.max(1);
        let offset = (page - 1) * per_page;
        let (top_docs, total) = searcher.search(
            &query,
            &(TopDocs::with_limit(per_page).and_offset(offset), Count),
        )?;

        let mut ids = Vec::with_capacity(top_docs.len());
        for (_score, doc_address) in top_docs {
            let doc: tantivy::TantivyDocument = searcher.doc(doc_address)?;
            if let Some(id) = doc.get_first(self.schema.doc_id).and_then(|v| v.as_str()) {
                ids.push(id.to_string());
            }
        }

        info!(
            collection,
            expression,
            page,
            matches = ids.len(),
            total,
            "Query complete"
        );

        Ok(QueryPage { ids, total })
    }

    /// Get the number of indexed documents.
    pub fn num_docs(&self) -> u64 {
        let searcher = self.reader.searcher();
        searcher
            .segment_readers()
            .iter()
            .map(|r| r.num_docs() as u64)
            .sum()
    }
}
