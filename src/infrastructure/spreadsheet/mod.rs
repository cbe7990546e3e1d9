mod xlsx_exporter;
mod xlsx_reader;

pub use xlsx_exporter::XlsxResultExporter;
pub use xlsx_reader::XlsxItemReader;
