use std::collections::HashMap;

use anyhow::Result;
use tracing::info;

use pipeline_domain::ports::CountryDirectory;

use crate::repositories::loader::{cell, column_index, parse_csv, read_table_source};

#[derive(Debug, Default)]
pub struct CountryTable {
    names: HashMap<String, String>,
}

impl CountryTable {
    pub async fn load(path: &str) -> Result<Self> {
        let content = read_table_source(path).await?;
        let table = Self::from_csv_str(&content)?;
        info!(path = %path, entries = table.len(), "loaded country table");
        Ok(table)
    }

    pub fn from_csv_str(content: &str) -> Result<Self> {
        let (headers, records) = parse_csv(content)?;
        let code_idx = column_index(&headers, "code")?;
        let name_idx = column_index(&headers, "name")?;
        let names = records
            .iter()
            .filter_map(|record| {
                let code = cell(record, Some(code_idx))?;
                let name = cell(record, Some(name_idx))?;
                Some((code.to_ascii_uppercase(), name.to_string()))
            })
            .collect();
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl CountryDirectory for CountryTable {
    fn country_name(&self, code: &str) -> Option<String> {
        self.names.get(&code.trim().to_ascii_uppercase()).cloned()
    }
}
