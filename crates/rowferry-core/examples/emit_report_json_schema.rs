use rowferry_core::MigrationReport;
use schemars::schema_for;

fn main() {
    let schema = schema_for!(MigrationReport);
    let json = serde_json::to_string_pretty(&schema).expect("serialize json schema");
    println!("{json}");
}
