use firetrack::run;

fn main() -> anyhow::Result<()> {
    // External calls are strictly sequential, so one thread is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run())
}
