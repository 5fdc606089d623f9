pub(crate) mod aggregation;
pub(crate) mod parse_client;
