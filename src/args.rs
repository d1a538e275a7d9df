use std::path::PathBuf;

/// Value of `--name value` or `--name=value` from the process arguments.
pub fn string_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    find_arg(&args, name)
}

pub fn path_arg(name: &str) -> Option<PathBuf> {
    string_arg(name).map(PathBuf::from)
}

pub fn u32_arg(name: &str) -> Option<u32> {
    string_arg(name)?.trim().parse::<u32>().ok()
}

pub fn usize_arg(name: &str) -> Option<usize> {
    string_arg(name)?.trim().parse::<usize>().ok()
}

pub fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}

/// First positional argument that is neither a flag nor a flag's value.
pub fn positional(index: usize) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    positional_in(&args, index)
}

fn find_arg(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn positional_in(args: &[String], index: usize) -> Option<String> {
    let mut skip_next = false;
    let mut seen = 0usize;
    for (idx, arg) in args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with("--") {
            if !arg.contains('=')
                && args
                    .get(idx + 1)
                    .is_some_and(|next| !next.starts_with("--"))
            {
                skip_next = true;
            }
            continue;
        }
        if seen == index {
            return Some(arg.clone());
        }
        seen += 1;
    }
    None
}
