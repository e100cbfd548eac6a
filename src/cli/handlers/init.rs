use crate::cli::commands::InitArgs;
use crate::io::board_io;

/// Infer a board name from a directory name: replace hyphens with spaces,
/// title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + &chars.collect::<String>()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn cmd_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let root = super::override_or_cwd()?;

    let name = args.name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .unwrap_or_else(|| "Home".to_string())
    });

    let board_dir = board_io::init_board(&root, &name, &args.user)?;
    let config = board_io::load_config(&board_dir)?;

    println!("Initialized board: {}", name);
    for user in &config.users {
        println!("  member: {}", user.name);
    }
    println!("Sign in with `tl user <name>`.");
    Ok(())
}
