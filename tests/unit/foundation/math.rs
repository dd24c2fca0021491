use super::*;

#[test]
fn mul_div255_identity_and_zero() {
    assert_eq!(mul_div255_u16(200, 255), 200);
    assert_eq!(mul_div255_u16(200, 0), 0);
    assert_eq!(mul_div255_u8(255, 128), 128);
}

#[test]
fn premul_then_unpremul_is_stable_for_opaque_and_half() {
    for c in [0u8, 1, 17, 128, 254, 255] {
        assert_eq!(unpremul_channel(premul_channel(c, 255), 255), c);
    }
    let p = premul_channel(200, 128);
    let back = unpremul_channel(p, 128);
    assert!((i16::from(back) - 200).abs() <= 1);
}

#[test]
fn unpremul_of_transparent_is_zero() {
    assert_eq!(unpremul_channel(10, 0), 0);
}
