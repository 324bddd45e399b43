#![no_main]

use bigmul_unit::{
    schoolbook_product, BigmulUnit, LatencyProfile, PipelineConfig, UnitConfig, OPERAND_BYTES,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let profile = LatencyProfile::ALL[usize::from(data[0]) % LatencyProfile::ALL.len()];
    let width = usize::from(data[1] % 64) + 1;
    let pipeline: PipelineConfig = profile.config().with_batch_width(width);

    let mut image = vec![0u8; OPERAND_BYTES * 2];
    for (slot, byte) in image.iter_mut().zip(&data[2..]) {
        *slot = *byte;
    }
    let (a_bytes, b_bytes) = image.split_at(OPERAND_BYTES);

    let mut unit = BigmulUnit::with_config(UnitConfig {
        pipeline,
        tracing_enabled: false,
    })
    .expect("width in 1..=64");
    unit.load_operand_bytes(a_bytes, b_bytes)
        .expect("images are exactly 512 bytes");
    unit.issue(0);
    let _ = unit.run_to_completion();

    let expected = schoolbook_product(unit.operands().a(), unit.operands().b());
    assert_eq!(unit.finished_result(), Some(&expected));

    let snapshot = unit.snapshot();
    let mut restored = BigmulUnit::new();
    restored.restore(&snapshot).expect("snapshot from a live unit");
    assert_eq!(restored.finished_result(), Some(&expected));
});
