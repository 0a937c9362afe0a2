pub mod module_scanner;
