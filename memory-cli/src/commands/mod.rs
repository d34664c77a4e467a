pub mod backfill;
pub mod correct;
pub mod decay;
pub mod deprecate;
pub mod ingest;
pub mod low_activation;
pub mod query;
pub mod stats;
pub mod top;
