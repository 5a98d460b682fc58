pub mod index_document;
