use hive_plan_executor_config::ExecutorConfig;
use schemars::schema_for;

fn main() {
    let schema = schema_for!(ExecutorConfig);

    match serde_json::to_string_pretty(&schema) {
        Ok(output) => println!("{}", output),
        Err(err) => {
            eprintln!("Failed to serialize the configuration schema: {}", err);
            std::process::exit(1);
        }
    }
}
