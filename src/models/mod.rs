mod stock_record;

pub use stock_record::StockRecord;
