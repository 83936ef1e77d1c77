use clap_complete::Shell;
use gongtimer_core::error::Result;

pub fn run(shell: Shell, cmd: &mut clap::Command) -> Result<()> {
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, cmd, name, &mut std::io::stdout());
    Ok(())
}
