use std::sync::Arc;

use rankdb_error::{ErrorKind, RankError, Result};
use tracing::debug;

use crate::records::{Record, Table};
use crate::schema::{Attribute, Schema};

/// Projection target: keep a subset of attributes, or rename while
/// restricting.
#[derive(Debug, Clone)]
pub enum Projection {
    /// Target schema, which must be a subschema of the input.
    Subschema(Schema),
    /// (source attribute, target attribute) pairs; targets must not collide.
    Rename(Vec<(String, String)>),
}

/// Eager projection.
///
/// Restricts (and optionally renames) each record's bindings; degrees are
/// untouched. The operator itself never collapses duplicates; materializing
/// into a [`Table`] applies that table's set semantics (no-rank duplicates
/// keep the largest degree), while the lazy variant streams duplicates
/// through unmerged.
#[derive(Debug)]
pub struct Project {
    input_schema: Arc<Schema>,
    output_schema: Arc<Schema>,
    /// Input value index per output attribute.
    indices: Vec<usize>,
}

impl Project {
    pub fn try_new(input_schema: Arc<Schema>, projection: Projection) -> Result<Self> {
        let (output_schema, indices) = match projection {
            Projection::Subschema(target) => {
                if !target.is_subschema_of(&input_schema) {
                    return Err(RankError::new(
                        ErrorKind::NotSubschema,
                        "projection target is not a subschema of the input",
                    )
                    .with_field("input", input_schema.as_ref())
                    .with_field("target", &target));
                }
                let indices = target
                    .iter()
                    .map(|(name, _)| {
                        // Subschema containment guarantees the lookup hits.
                        input_schema.index_of(name).unwrap_or_default()
                    })
                    .collect();
                (target, indices)
            }
            Projection::Rename(pairs) => {
                let mut attrs = Vec::with_capacity(pairs.len());
                let mut indices = Vec::with_capacity(pairs.len());
                for (source, target) in pairs {
                    let datatype = input_schema.datatype(&source).ok_or_else(|| {
                        RankError::new(
                            ErrorKind::AttributeNotInSchema,
                            "projection source attribute missing from the input",
                        )
                        .with_field("attribute", source.clone())
                        .with_field("input", input_schema.as_ref())
                    })?;
                    indices.push(
                        input_schema
                            .index_of(&source)
                            .unwrap_or_default(),
                    );
                    attrs.push(Attribute::new(target, datatype));
                }
                // Colliding targets surface as DuplicateAttributeName here.
                (Schema::try_new(attrs)?, indices)
            }
        };

        Ok(Project {
            input_schema,
            output_schema: Arc::new(output_schema),
            indices,
        })
    }

    pub fn output_schema(&self) -> &Arc<Schema> {
        &self.output_schema
    }

    /// Reshape one record. Shared by the eager and lazy strategies.
    pub(crate) fn apply(&self, record: &Record) -> Record {
        let values = self
            .indices
            .iter()
            .map(|&idx| record.values()[idx].clone())
            .collect();
        // Indices and domains were fixed at construction.
        Record::try_new(self.output_schema.clone(), values, record.degree())
            .unwrap_or_else(|_| unreachable!("projected record disagrees with projected schema"))
    }

    pub fn execute(&self, input: &Table) -> Result<Table> {
        if *input.schema().as_ref() != *self.input_schema {
            return Err(RankError::new(
                ErrorKind::SchemaNotEqual,
                "input table schema does not match the projection's input schema",
            )
            .with_field("expected", self.input_schema.as_ref())
            .with_field("got", input.schema().as_ref()));
        }

        let mut out = Table::new(self.output_schema.clone());
        for record in input.iter() {
            out.push(self.apply(&record))?;
        }

        debug!(input = input.len(), output = out.len(), "project");
        Ok(out)
    }
}
