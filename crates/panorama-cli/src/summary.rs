use console::Style;
use panorama_core::pipeline::config::PipelineConfig;
use panorama_core::pipeline::PipelineOutput;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_pipeline_summary(config: &PipelineConfig, engine_name: &str) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Panorama Pipeline"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(17)));
    println!();

    if let Some(ref video) = config.video {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Video"),
            s.path.apply_to(video.display())
        );
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.path.apply_to(config.frames_dir.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    match config.equirect_output {
        Some(ref path) => println!(
            "  {:<14}{}",
            s.label.apply_to("Equirect"),
            s.path.apply_to(path.display())
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Equirect"),
            s.disabled.apply_to("disabled")
        ),
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Engine"),
        s.method.apply_to(engine_name)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Workers"),
        s.value.apply_to(config.workers)
    );
    println!();

    if config.video.is_some() {
        println!("  {}", s.header.apply_to("Sampling"));
        println!(
            "    {:<12}{}",
            s.label.apply_to("Interval"),
            s.value.apply_to(format!("every {} frame(s)", config.sampling.interval))
        );
        println!();
    }

    println!("  {}", s.header.apply_to("Preprocessing"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Blur"),
        s.value.apply_to(format!("{0}x{0} Gaussian", config.preprocess.kernel_size))
    );
    println!();

    let st = &config.stitch;
    println!("  {}", s.header.apply_to("Stitching"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Confidence"),
        s.value.apply_to(st.confidence_threshold)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Register"),
        s.value.apply_to(format!("{} Mpx", st.registration_resolution))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Seams"),
        s.value.apply_to(format!("{} Mpx", st.seam_estimation_resolution))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Composite"),
        s.value.apply_to(st.compositing_resolution)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Fallback"),
        s.value.apply_to(format!(
            "groups of {} above {} items",
            st.group_size, st.fallback_min_items
        ))
    );
    println!();
}

pub fn print_run_result(output: &PipelineOutput) {
    let s = Styles::new();

    println!("  {}", s.header.apply_to("Result"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{}x{}", output.width, output.height))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(output.frames_used)
    );
    if !output.skipped.is_empty() {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Skipped"),
            s.disabled.apply_to(output.skipped.len())
        );
        for item in &output.skipped {
            println!("      {} {}", s.label.apply_to(&item.source_id), item.reason);
        }
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Attempts"),
        s.value.apply_to(output.attempts.len())
    );
    if output.used_fallback {
        for attempt in &output.attempts {
            println!(
                "      {:<28}{}",
                s.label.apply_to(attempt.scope),
                s.method.apply_to(attempt.status)
            );
        }
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Saved"),
        s.path.apply_to(output.composite_path.display())
    );
    if let Some(ref path) = output.equirect_path {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Equirect"),
            s.path.apply_to(path.display())
        );
    }
    println!();
}
