//! Live schema extraction.

use crate::error::Result;
use crate::schema::{Domain, Procedure, SchemaSnapshot, Table};

/// Reads the existing schema from a target database.
///
/// Ordering within each returned list is not significant.
#[allow(async_fn_in_trait)]
pub trait MetadataSource {
    /// Returns every user-defined domain.
    async fn extract_domains(&self) -> Result<Vec<Domain>>;

    /// Returns every table, with its columns populated.
    async fn extract_tables(&self) -> Result<Vec<Table>>;

    /// Returns every stored procedure.
    async fn extract_procedures(&self) -> Result<Vec<Procedure>>;

    /// Extracts domains, tables and procedures, in that order.
    async fn snapshot(&self) -> Result<SchemaSnapshot> {
        let domains = self.extract_domains().await?;
        let tables = self.extract_tables().await?;
        let procedures = self.extract_procedures().await?;
        Ok(SchemaSnapshot::new(domains, tables, procedures))
    }
}
