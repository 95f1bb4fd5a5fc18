use super::entity::TableEntity;

/// Largest number of operations the table service accepts in one batch transaction.
pub const MAX_OPERATIONS_PER_BATCH: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub enum TableOperation {
    Insert(TableEntity),
}

impl TableOperation {
    pub const fn entity(&self) -> &TableEntity {
        match self {
            TableOperation::Insert(entity) => entity,
        }
    }
}

/// A group of operations submitted together as one transaction.
///
/// All operations of a batch share a partition key, and a batch never holds more than
/// [`MAX_OPERATIONS_PER_BATCH`] of them.
#[derive(Clone, Debug, PartialEq)]
pub struct TableBatch {
    partition_key: String,
    operations: Vec<TableOperation>,
}

impl TableBatch {
    pub fn new(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            operations: Vec::new(),
        }
    }

    /// Adds an insert for `entity`, handing the entity back if it can't join this batch.
    pub fn insert(&mut self, entity: TableEntity) -> Result<(), TableEntity> {
        if self.is_full() || entity.partition_key != self.partition_key {
            return Err(entity);
        }
        self.operations.push(TableOperation::Insert(entity));
        Ok(())
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn entities(&self) -> impl Iterator<Item = &TableEntity> {
        self.operations.iter().map(TableOperation::entity)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.operations.len() >= MAX_OPERATIONS_PER_BATCH
    }
}

/// Splits entities into batches, preserving their order.
///
/// A new batch is started whenever the partition key differs from the previous entity's or the
/// current batch is full. Entities that share a partition key but are not adjacent land in
/// different batches.
pub fn plan_batches<I>(entities: I) -> Vec<TableBatch>
where
    I: IntoIterator<Item = TableEntity>,
{
    let mut batches = Vec::new();
    let mut current: Option<TableBatch> = None;

    for entity in entities {
        let entity = match current.as_mut() {
            Some(batch) => match batch.insert(entity) {
                Ok(()) => continue,
                Err(entity) => entity,
            },
            None => entity,
        };

        let mut batch = TableBatch::new(entity.partition_key.clone());
        batch.operations.push(TableOperation::Insert(entity));
        if let Some(closed) = current.replace(batch) {
            batches.push(closed);
        }
    }

    batches.extend(current);
    batches
}
