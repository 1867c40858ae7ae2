pub mod external_symbol;
pub mod symbol;
pub mod symbol_interface_mapping;
pub mod symbol_super_mapping;
