pub mod datastore;
pub mod objstore;
pub mod thirdparty;
