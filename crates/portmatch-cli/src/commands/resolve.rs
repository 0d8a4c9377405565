use crate::support::{
    exit_with, load_descriptor_or_exit, load_request_or_exit, render_json_or_exit,
    write_debug_json_or_exit,
};
use portmatch_db::{DescriptorKind, DescriptorStore, PLATFORM_DEFAULTS_NAME, SearchPath};
use portmatch_kernel::{
    PlatformDefaults, Resolution, merge_overrides, negotiate, offering_set, platform_defaults,
    requirement_set,
};
use serde::Serialize;
use serde_json::Map;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct ResolveArgs {
    pub platform: String,
    pub ifc: Option<String>,
    pub src: Option<PathBuf>,
    pub default_ifc: Option<String>,
    pub tgt: PathBuf,
    pub debug: bool,
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct ResolveReport<'a> {
    #[serde(flatten)]
    resolution: &'a Resolution,
    platform_defaults: &'a PlatformDefaults,
}

pub fn run(args: ResolveArgs) {
    let request = load_request_or_exit(
        args.ifc.as_deref(),
        args.src.as_deref(),
        args.default_ifc.as_deref(),
    );
    info!(class = %request.class, "AFU interface requested");

    let platform_path = SearchPath::platforms();
    let platforms = DescriptorStore::new(platform_path.clone(), DescriptorKind::Platform);
    let interfaces = DescriptorStore::new(SearchPath::interfaces(), DescriptorKind::Interface);

    let platform = load_descriptor_or_exit(&platforms, &args.platform);
    let offerings = offering_set(&platform).unwrap_or_else(|e| exit_with(e));
    let defaults = load_platform_defaults(platform_path);

    let base = load_descriptor_or_exit(&interfaces, &request.class);
    let base = requirement_set(&base).unwrap_or_else(|e| exit_with(e));
    let requirements = merge_overrides(&base, &request.overrides, request.overrides_origin())
        .unwrap_or_else(|e| exit_with(e));

    if args.debug {
        write_debug_json_or_exit(&args.tgt, "afu_ifc_db", &requirements);
        write_debug_json_or_exit(&args.tgt, "platform_db", &offerings);
        write_debug_json_or_exit(&args.tgt, "platform_defaults_db", &defaults);
    }

    let matches = negotiate(&requirements, &offerings).unwrap_or_else(|e| exit_with(e));
    let resolution = Resolution::new(requirements, offerings, matches);
    if args.debug {
        write_debug_json_or_exit(&args.tgt, "port_list", &resolution.matches);
    }

    if args.json {
        let report = ResolveReport {
            resolution: &resolution,
            platform_defaults: &defaults,
        };
        println!("{}", render_json_or_exit(&report, "resolve"));
        return;
    }

    println!("portmatch resolve");
    println!(
        "  Platform: {} ({})",
        resolution.offerings.platform_name, resolution.offerings.origin
    );
    println!(
        "  Interface: {} ({})",
        resolution.requirements.class, resolution.requirements.origin
    );
    println!("  Matches: {}", resolution.matches.len());
    for resolved in &resolution.matches {
        match resolved.num_entries {
            Some(entries) => println!(
                "    - {} [num-entries: {entries}]",
                resolved.requirement.key()
            ),
            None => println!("    - {}", resolved.requirement.key()),
        }
    }
    println!("  Digest: {}", resolution.digest);
}

fn load_platform_defaults(search_path: SearchPath) -> PlatformDefaults {
    let store = DescriptorStore::new(search_path, DescriptorKind::PlatformDefaults);
    match store.try_load(PLATFORM_DEFAULTS_NAME) {
        Ok(Some(descriptor)) => platform_defaults(&descriptor).unwrap_or_else(|e| exit_with(e)),
        Ok(None) => {
            warn!(
                name = PLATFORM_DEFAULTS_NAME,
                "platform defaults not found, continuing with none"
            );
            PlatformDefaults {
                name: PLATFORM_DEFAULTS_NAME.to_string(),
                origin: String::new(),
                params: Map::new(),
            }
        }
        Err(err) => exit_with(err),
    }
}
