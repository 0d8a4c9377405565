use crate::support::{render_json_or_exit, search_path_rows};
use portmatch_db::{SearchPath, discover_interfaces};
use serde_json::json;

pub fn run(json_output: bool) {
    let search_path = SearchPath::interfaces();
    let interfaces = discover_interfaces(&search_path);
    let dirs = search_path_rows(&search_path);

    if json_output {
        let payload = json!({
            "searchPath": dirs
                .iter()
                .map(|(dir, is_default)| json!({"dir": dir, "default": is_default}))
                .collect::<Vec<_>>(),
            "interfaces": interfaces,
        });
        println!("{}", render_json_or_exit(&payload, "interfaces"));
        return;
    }

    println!("portmatch interfaces");
    println!("  Search path:");
    for (dir, is_default) in &dirs {
        let marker = if *is_default { " (default)" } else { "" };
        println!("    {dir}{marker}");
    }
    println!("  AFU top-level interfaces: {}", interfaces.len());
    for interface in &interfaces {
        println!("    - {interface}");
    }
}
