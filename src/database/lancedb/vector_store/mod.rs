
use super::{ChunkMetadata, EmbeddingRecord};
use crate::RecommenderError;
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType,
    query::{ExecutableQuery, QueryBase},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

const TABLE_NAME: &str = "anime_chunks";

/// Below this many rows LanceDB cannot train an ANN index; brute force is used instead
pub const MIN_ROWS_FOR_VECTOR_INDEX: u64 = 256;

/// Vector database store using LanceDB for similarity search
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    path: PathBuf,
    vector_dimension: Option<usize>,
}

/// Search result from vector similarity search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk_metadata: ChunkMetadata,
    pub similarity_score: f32,
    pub distance: f32,
}

impl VectorStore {
    /// Create an empty store at `path`, discarding any index already there
    ///
    /// # Arguments
    /// * `path` - Directory that will hold the LanceDB files
    ///
    /// # Returns
    /// * `Result<Self, RecommenderError>` - New VectorStore instance or error
    #[inline]
    pub async fn create(path: &Path) -> Result<Self, RecommenderError> {
        debug!("Creating LanceDB vector store at {}", path.display());

        std::fs::create_dir_all(path).map_err(|e| {
            RecommenderError::Database(format!("Failed to create vector database directory: {}", e))
        })?;

        let connection = Self::connect(path).await.inspect_err(|e| {
            error!("Failed to connect to LanceDB at {}: {}", path.display(), e);
        })?;

        let store = Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            path: path.to_path_buf(),
            vector_dimension: None,
        };

        store.drop_table_if_exists().await?;

        info!("Vector store created at {}", path.display());
        Ok(store)
    }

    /// Open an existing store read-only for querying
    ///
    /// # Arguments
    /// * `path` - Directory previously populated by [`VectorStore::create`]
    ///
    /// # Returns
    /// * `Result<Self, RecommenderError>` - The opened store, or `IndexNotFound`
    #[inline]
    pub async fn open(path: &Path) -> Result<Self, RecommenderError> {
        if !path.is_dir() {
            return Err(RecommenderError::IndexNotFound(path.display().to_string()));
        }

        let connection = Self::connect(path).await?;
        let mut store = Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            path: path.to_path_buf(),
            vector_dimension: None,
        };

        if !store.table_exists().await? {
            return Err(RecommenderError::IndexNotFound(path.display().to_string()));
        }

        let dimension = store.detect_existing_vector_dimension().await?;
        store.vector_dimension = Some(dimension);

        info!(
            "Opened vector store at {} ({} dimensions)",
            path.display(),
            dimension
        );
        Ok(store)
    }

    async fn connect(path: &Path) -> Result<Connection, RecommenderError> {
        let uri = path.display().to_string();
        lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| RecommenderError::Database(format!("Failed to connect to LanceDB: {}", e)))
    }

    /// Directory holding the LanceDB files
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dimension of stored vectors, known once the first batch is written
    #[inline]
    pub fn vector_dimension(&self) -> Option<usize> {
        self.vector_dimension
    }

    async fn table_exists(&self) -> Result<bool, RecommenderError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RecommenderError::Database(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.contains(&self.table_name))
    }

    /// Detect vector dimension from existing table schema
    async fn detect_existing_vector_dimension(&self) -> Result<usize, RecommenderError> {
        let table = self.open_table().await?;

        let schema = table
            .schema()
            .await
            .map_err(|e| RecommenderError::Database(format!("Failed to get table schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(RecommenderError::Database(
            "Could not find vector column or determine dimension".to_string(),
        ))
    }

    async fn open_table(&self) -> Result<lancedb::Table, RecommenderError> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RecommenderError::Database(format!("Failed to open table: {}", e)))
    }

    /// Create schema with the specified vector dimension
    fn create_schema(vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("content", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("row", DataType::UInt32, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Store multiple embeddings in a batch. The first batch fixes the
    /// vector dimension of the table; later batches must match it.
    ///
    /// # Arguments
    /// * `records` - Vector of embedding records to store
    ///
    /// # Returns
    /// * `Result<(), RecommenderError>` - Success or error
    #[inline]
    pub async fn store_embeddings_batch(
        &mut self,
        records: Vec<EmbeddingRecord>,
    ) -> Result<(), RecommenderError> {
        let Some(first) = records.first() else {
            debug!("No embeddings to store");
            return Ok(());
        };

        debug!("Storing batch of {} embeddings", records.len());

        let vector_dim = first.vector.len();
        if vector_dim == 0 {
            return Err(RecommenderError::Database(
                "Cannot store empty embedding vectors".to_string(),
            ));
        }

        match self.vector_dimension {
            None => {
                let schema = Self::create_schema(vector_dim);
                self.connection
                    .create_empty_table(&self.table_name, schema)
                    .execute()
                    .await
                    .map_err(|e| {
                        RecommenderError::Database(format!("Failed to create table: {}", e))
                    })?;
                self.vector_dimension = Some(vector_dim);
                info!("Created {} table with {} dimensions", self.table_name, vector_dim);
            }
            Some(existing) if existing != vector_dim => {
                return Err(RecommenderError::Database(format!(
                    "Vector dimension mismatch: table has {}, batch has {}",
                    existing, vector_dim
                )));
            }
            Some(_) => {}
        }

        let record_batch = Self::create_record_batch(&records, vector_dim)?;
        let table = self.open_table().await?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table.add(reader).execute().await.map_err(|e| {
            RecommenderError::Database(format!("Failed to insert embeddings: {}", e))
        })?;

        debug!("Stored {} embeddings", records.len());
        Ok(())
    }

    /// Create a RecordBatch from embedding records
    fn create_record_batch(
        records: &[EmbeddingRecord],
        vector_dim: usize,
    ) -> Result<RecordBatch, RecommenderError> {
        let len = records.len();

        let mut ids = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);
        let mut contents = Vec::with_capacity(len);
        let mut sources = Vec::with_capacity(len);
        let mut rows = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);

        for record in records {
            if record.vector.len() != vector_dim {
                return Err(RecommenderError::Database(format!(
                    "Embedding {} has {} dimensions, expected {}",
                    record.id,
                    record.vector.len(),
                    vector_dim
                )));
            }

            ids.push(record.id.as_str());
            flat_values.extend_from_slice(&record.vector);
            contents.push(record.metadata.content.as_str());
            sources.push(record.metadata.source.as_str());
            rows.push(record.metadata.row);
            chunk_indices.push(record.metadata.chunk_index);
            created_ats.push(record.metadata.created_at.as_str());
        }

        let schema = Self::create_schema(vector_dim);

        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array =
            FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
                .map_err(|e| {
                    RecommenderError::Database(format!("Failed to create vector array: {}", e))
                })?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(sources)),
            Arc::new(UInt32Array::from(rows)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(schema, arrays).map_err(|e| {
            RecommenderError::Database(format!("Failed to create record batch: {}", e))
        })
    }

    /// Search for similar embeddings using cosine distance
    ///
    /// # Arguments
    /// * `query_vector` - The query vector to search for
    /// * `limit` - Maximum number of results to return
    ///
    /// # Returns
    /// * `Result<Vec<SearchResult>, RecommenderError>` - Results, most similar first
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, RecommenderError> {
        debug!("Searching for similar vectors with limit: {}", limit);

        let Some(dimension) = self.vector_dimension else {
            return Err(RecommenderError::IndexNotFound(self.path.display().to_string()));
        };

        if query_vector.len() != dimension {
            return Err(RecommenderError::Database(format!(
                "Query vector has {} dimensions, index has {}",
                query_vector.len(),
                dimension
            )));
        }

        let table = self.open_table().await?;

        let results = table
            .vector_search(query_vector)
            .map_err(|e| {
                RecommenderError::Database(format!("Failed to create vector search: {}", e))
            })?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| RecommenderError::Database(format!("Failed to execute search: {}", e)))?;

        let mut search_results = Self::parse_search_results_stream(results).await?;
        search_results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(search_results)
    }

    /// Parse search results from LanceDB stream into SearchResult structs
    async fn parse_search_results_stream(
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<SearchResult>, RecommenderError> {
        let mut search_results = Vec::new();

        while let Some(batch_result) = results.try_next().await.map_err(|e| {
            RecommenderError::Database(format!("Failed to read result stream: {}", e))
        })? {
            search_results.extend(Self::parse_search_batch(&batch_result)?);
        }

        debug!("Parsed {} search results from stream", search_results.len());
        Ok(search_results)
    }

    /// Parse a single record batch from search results
    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>, RecommenderError> {
        let contents = string_column(batch, "content")?;
        let sources = string_column(batch, "source")?;
        let rows = u32_column(batch, "row")?;
        let chunk_indices = u32_column(batch, "chunk_index")?;
        let created_ats = string_column(batch, "created_at")?;

        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

        let search_results = (0..batch.num_rows())
            .map(|row| {
                let distance =
                    distances.map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

                SearchResult {
                    chunk_metadata: ChunkMetadata {
                        content: contents.value(row).to_string(),
                        source: sources.value(row).to_string(),
                        row: rows.value(row),
                        chunk_index: chunk_indices.value(row),
                        created_at: created_ats.value(row).to_string(),
                    },
                    // Cosine distance lies in [0, 2]; convert so higher is better
                    similarity_score: 1.0 - distance,
                    distance,
                }
            })
            .collect();

        Ok(search_results)
    }

    /// Get the total number of embeddings stored
    #[inline]
    pub async fn count_embeddings(&self) -> Result<u64, RecommenderError> {
        if !self.table_exists().await? {
            return Ok(0);
        }

        let table = self.open_table().await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| RecommenderError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Create index on the vector column for improved search performance
    #[inline]
    pub async fn create_vector_index(&self) -> Result<(), RecommenderError> {
        debug!("Creating vector index for improved search performance");

        let table = self.open_table().await?;
        table
            .create_index(&["vector"], lancedb::index::Index::Auto)
            .execute()
            .await
            .map_err(|e| {
                RecommenderError::Database(format!("Failed to create vector index: {}", e))
            })?;

        info!("Vector index created successfully");
        Ok(())
    }

    /// Drop the chunk table if it exists
    async fn drop_table_if_exists(&self) -> Result<(), RecommenderError> {
        if self.table_exists().await? {
            info!("Dropping existing {} table", self.table_name);
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| RecommenderError::Database(format!("Failed to drop table: {}", e)))?;
        }

        Ok(())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, RecommenderError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RecommenderError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RecommenderError::Database(format!("Invalid {} column type", name)))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array, RecommenderError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RecommenderError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| RecommenderError::Database(format!("Invalid {} column type", name)))
}
