pub mod azure_table;
