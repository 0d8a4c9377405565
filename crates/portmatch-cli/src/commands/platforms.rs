use crate::support::{render_json_or_exit, search_path_rows};
use portmatch_db::{SearchPath, discover_platforms};
use serde_json::json;

pub fn run(json_output: bool) {
    let search_path = SearchPath::platforms();
    let platforms = discover_platforms(&search_path);
    let dirs = search_path_rows(&search_path);

    if json_output {
        let payload = json!({
            "searchPath": dirs
                .iter()
                .map(|(dir, is_default)| json!({"dir": dir, "default": is_default}))
                .collect::<Vec<_>>(),
            "platforms": platforms,
        });
        println!("{}", render_json_or_exit(&payload, "platforms"));
        return;
    }

    println!("portmatch platforms");
    println!("  Search path:");
    for (dir, is_default) in &dirs {
        if *is_default {
            println!("    {dir} (default)");
        } else {
            println!("    {dir}");
        }
    }
    println!("  Platforms: {}", platforms.len());
    for platform in &platforms {
        println!("    - {platform}");
    }
}
