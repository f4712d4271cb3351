//! Compiled-in default option sets, one function per mod type.

use super::{ModOption, OptionValue, UiHint};

fn bool_opt(key: &str, name: &str, category: &str, value: bool) -> ModOption {
    ModOption::new(key, name, category, OptionValue::Bool(value)).on_off()
}

fn float_opt(key: &str, name: &str, category: &str, value: f64) -> ModOption {
    ModOption::new(key, name, category, OptionValue::Float(value))
}

fn int_opt(key: &str, name: &str, category: &str, value: i64) -> ModOption {
    ModOption::new(key, name, category, OptionValue::Int(value))
}

fn key_code(key: &str, name: &str, parent: &str, code: i64) -> ModOption {
    int_opt(key, name, "Hotkeys", code).under(parent)
}

fn key_combo(key: &str, name: &str, parent: &str, combo: &[&str]) -> ModOption {
    ModOption::new(
        key,
        name,
        "Hotkeys",
        OptionValue::List(combo.iter().map(|k| k.to_string()).collect()),
    )
    .under(parent)
    .hint(UiHint::KeyCombo)
}

fn choice(option: ModOption, choices: &[(&str, &str)]) -> ModOption {
    choices.iter().fold(option, |option, (value, name)| {
        option.hint(UiHint::Choice {
            value: OptionValue::Text(value.to_string()),
            name: name.to_string(),
        })
    })
}

fn hotkey_modifiers(parent: &str) -> Vec<ModOption> {
    vec![
        bool_opt("enabled", "Hotkeys Enabled", "Hotkeys", true).under(parent),
        bool_opt("requireCtrl", "Require Ctrl", "Hotkeys", false).under(parent),
        bool_opt("requireAlt", "Require Alt", "Hotkeys", false).under(parent),
        bool_opt("requireShift", "Require Shift", "Hotkeys", false).under(parent),
    ]
}

/// OpenVR FSR (`openvr_mod.cfg`, section `fsr`).
pub fn fsr() -> Vec<ModOption> {
    let category = "FSR Settings";
    let mut options = vec![
        bool_opt("enabled", "Enabled", category, true)
            .desc("Upscale the image with AMD FSR or NVIDIA NIS."),
        bool_opt("useNIS", "Use NVIDIA's Image Scaling", category, false)
            .desc("Use NVIDIA Image Scaling instead of AMD FidelityFX Super Resolution."),
        float_opt("renderScale", "Render Scale", category, 0.77)
            .desc("Per-dimension render scale. Below 1 renders at a lower resolution first.")
            .range(0.10, 3.00, 0.01),
        float_opt("sharpness", "Sharpness", category, 0.9)
            .desc("How strongly the upscaled image is sharpened.")
            .range(0.10, 3.00, 0.01),
        float_opt("radius", "Radius", category, 0.50)
            .desc("Upscale inside this radius around the lens centre, bilinear outside.")
            .range(0.20, 2.00, 0.01),
        bool_opt("applyMIPBias", "Apply MIP Bias", category, true)
            .desc("Bias texture sampling towards the target resolution."),
        bool_opt("debugMode", "Debug Mode", category, false)
            .desc("Visualise the upscaling radius and log frame timings."),
        ModOption::group("hotkeys", "Hotkeys", "Hotkeys"),
    ];
    options.extend(hotkey_modifiers("hotkeys"));
    options.extend([
        key_code("toggleUseNIS", "Toggle NIS", "hotkeys", 112),
        key_code("toggleDebugMode", "Toggle Debug Mode", "hotkeys", 113),
        key_code("decreaseSharpness", "Decrease Sharpness", "hotkeys", 114),
        key_code("increaseSharpness", "Increase Sharpness", "hotkeys", 115),
        key_code("decreaseRadius", "Decrease Radius", "hotkeys", 116),
        key_code("increaseRadius", "Increase Radius", "hotkeys", 117),
        key_code("captureOutput", "Capture Output", "hotkeys", 118),
    ]);
    options
}

/// OpenVR Foveated (`openvr_mod.cfg`, section `foveated`).
pub fn foveated() -> Vec<ModOption> {
    let category = "Foveated Settings";
    let mut options = vec![
        bool_opt("enabled", "Enabled", category, true),
        bool_opt("useVariableRateShading", "Use Variable Rate Shading", category, true)
            .desc("Shade the image edges at a reduced rate. Requires NVIDIA RTX or GTX 16xx."),
        float_opt("innerRadius", "Inner Radius", category, 0.60).range(0.20, 2.00, 0.01),
        float_opt("midRadius", "Mid Radius", category, 0.80).range(0.20, 2.00, 0.01),
        float_opt("outerRadius", "Outer Radius", category, 1.00).range(0.20, 2.00, 0.01),
        ModOption::group("sharpen", "Sharpen", "Sharpening"),
        bool_opt("enabled", "Sharpen Enabled", "Sharpening", true).under("sharpen"),
        float_opt("sharpness", "Sharpness", "Sharpening", 0.40)
            .under("sharpen")
            .range(0.00, 1.00, 0.01),
        float_opt("radius", "Radius", "Sharpening", 0.75)
            .under("sharpen")
            .range(0.20, 2.00, 0.01),
        bool_opt("debugMode", "Debug Mode", category, false),
        ModOption::group("hotkeys", "Hotkeys", "Hotkeys"),
    ];
    options.extend(hotkey_modifiers("hotkeys"));
    options.extend([
        key_code("toggleFFR", "Toggle FFR", "hotkeys", 112),
        key_code("toggleDebugMode", "Toggle Debug Mode", "hotkeys", 113),
        key_code("decreaseSharpness", "Decrease Sharpness", "hotkeys", 114),
        key_code("increaseSharpness", "Increase Sharpness", "hotkeys", 115),
        key_code("decreaseRadius", "Decrease Radius", "hotkeys", 116),
        key_code("increaseRadius", "Increase Radius", "hotkeys", 117),
        key_code("selectInnerRadius", "Select Inner Radius", "hotkeys", 49),
        key_code("selectMidRadius", "Select Mid Radius", "hotkeys", 50),
        key_code("selectOuterRadius", "Select Outer Radius", "hotkeys", 51),
        key_code("selectSharpenRadius", "Select Sharpen Radius", "hotkeys", 52),
        key_code("captureOutput", "Capture Output", "hotkeys", 118),
        key_code("toggleUseVRS", "Toggle VRS", "hotkeys", 119),
    ]);
    options
}

/// VRPerfKit (`vrperfkit.yml`).
pub fn vrperfkit() -> Vec<ModOption> {
    let up = "Upscaling";
    let ffr = "FFR";
    let mut options = vec![
        ModOption::group("upscaling", "Upscaling", up),
        bool_opt("enabled", "Enabled", up, true).under("upscaling"),
        choice(
            ModOption::new("method", "Method", up, OptionValue::Text("nis".to_string()))
                .under("upscaling")
                .desc("Upscaling method; every option works on every GPU."),
            &[("fsr", "FSR"), ("nis", "NIS"), ("cas", "CAS")],
        ),
        float_opt("renderScale", "Render Scale", up, 70.0)
            .under("upscaling")
            .desc("Percentage of the SteamVR resolution the GPU renders before upscaling.")
            .hint(UiHint::Range {
                min: 0.10,
                max: 999.0,
                step: 1.0,
                display: Some("percent".to_string()),
            }),
        float_opt("sharpness", "Sharpness", up, 0.3)
            .under("upscaling")
            .range(0.0, 3.0, 0.01),
        float_opt("radius", "Radius", up, 0.95)
            .under("upscaling")
            .range(0.20, 3.0, 0.01),
        bool_opt("applyMipBias", "Apply MIP Bias", up, true).under("upscaling"),
        ModOption::group("fixedFoveated", "Fixed Foveated Rendering", ffr),
        bool_opt("enabled", "Enabled", ffr, false).under("fixedFoveated"),
        choice(
            ModOption::new("method", "Method", ffr, OptionValue::Text("vrs".to_string()))
                .under("fixedFoveated"),
            &[("vrs", "Variable Rate Shading"), ("rdm", "Radial Density Mask")],
        ),
        bool_opt("dynamic", "Dynamic", ffr, false).under("fixedFoveated"),
        float_opt("targetFPS", "Target FPS", ffr, 60.0).under("fixedFoveated"),
        float_opt("marginFPS", "Margin FPS", ffr, 65.0).under("fixedFoveated"),
        bool_opt("dynamicChangeRadius", "Dynamic Change Radius", ffr, true).under("fixedFoveated"),
        float_opt("minRadius", "Min Radius", ffr, 0.30).under("fixedFoveated"),
        float_opt("decreaseRadiusStep", "Decrease Radius Step", ffr, 0.01).under("fixedFoveated"),
        float_opt("increaseRadiusStep", "Increase Radius Step", ffr, 0.02).under("fixedFoveated"),
        float_opt("innerRadius", "Inner Radius", ffr, 0.50).under("fixedFoveated"),
        float_opt("midRadius", "Mid Radius", ffr, 0.65).under("fixedFoveated"),
        float_opt("outerRadius", "Outer Radius", ffr, 0.80).under("fixedFoveated"),
        float_opt("edgeRadius", "Edge Radius", ffr, 1.15).under("fixedFoveated"),
        bool_opt("preciseResolution", "Precise Resolution", ffr, true).under("fixedFoveated"),
        int_opt("renderOnlyTarget", "Render Only Target", ffr, 0).under("fixedFoveated"),
        int_opt("ignoreFirstTargetRenders", "Ignore First Target Renders", ffr, 0)
            .under("fixedFoveated"),
        int_opt("ignoreLastTargetRenders", "Ignore Last Target Renders", ffr, 0)
            .under("fixedFoveated"),
        bool_opt("favorHorizontal", "Favor Horizontal", ffr, true).under("fixedFoveated"),
        bool_opt("fastMode", "Fast Mode", ffr, false).under("fixedFoveated"),
        bool_opt("fastModeUsesHRMCount", "Fast Mode Uses HRM Count", ffr, false)
            .under("fixedFoveated"),
        ModOption::group("hotkeys", "Hotkeys", "Hotkeys"),
        bool_opt("enabled", "Hotkeys Enabled", "Hotkeys", true).under("hotkeys"),
    ];

    let combos: [(&str, &str, [&str; 2]); 10] = [
        ("toggleDebugMode", "Toggle Debug Mode", ["ctrl", "f1"]),
        ("cycleUpscalingMethod", "Cycle Upscaling Method", ["ctrl", "f2"]),
        ("increaseUpscalingRadius", "Increase Upscaling Radius", ["ctrl", "f3"]),
        ("decreaseUpscalingRadius", "Decrease Upscaling Radius", ["ctrl", "f4"]),
        ("increaseUpscalingSharpness", "Increase Upscaling Sharpness", ["ctrl", "f5"]),
        ("decreaseUpscalingSharpness", "Decrease Upscaling Sharpness", ["ctrl", "f6"]),
        ("toggleUpscalingApplyMipBias", "Toggle Upscaling MIP Bias", ["ctrl", "f7"]),
        ("captureOutput", "Capture Output", ["ctrl", "f8"]),
        ("toggleFixedFoveated", "Toggle Fixed Foveated", ["alt", "f1"]),
        ("toggleFFRFavorHorizontal", "Toggle FFR Favor Horizontal", ["alt", "f2"]),
    ];
    options.extend(
        combos
            .iter()
            .map(|(key, name, combo)| key_combo(key, name, "hotkeys", combo)),
    );
    options.push(
        bool_opt("debugMode", "Debug Mode", "Debug Mode", false)
            .desc("Visualise the upscaling radius and report post-processing GPU time."),
    );
    options
}

#[cfg(test)]
mod tests {
    use super::super::check_shape;
    use super::*;

    #[test]
    fn test_default_sets_are_well_formed() {
        for options in [fsr(), foveated(), vrperfkit()] {
            assert!(check_shape(&options).is_ok(), "{:?}", check_shape(&options));
        }
    }

    #[test]
    fn test_fsr_defaults() {
        let options = fsr();
        let scale = options.iter().find(|o| o.key == "renderScale").unwrap();
        assert_eq!(scale.value, OptionValue::Float(0.77));
        assert_eq!(options.iter().filter(|o| o.hidden).count(), 1);
    }
}
