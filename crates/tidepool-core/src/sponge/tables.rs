//! Fixed constant tables shared by every sponge variant.

/// Initialization vector for the sponge state.
///
/// Every 4-bit nibble of every word carries exactly two set bits, so a fresh
/// state starts with a perfectly balanced Hamming weight (32 ones per word) and
/// no nibble-level bias. [`nibble_balanced`] enforces this at construction.
pub const INIT_VECTOR: [u64; 16] = [
    0xAA53_3C95_6999_CC6C,
    0x59C9_6C36_3655_935A,
    0xC59A_9955_C633_A659,
    0xC536_63A3_C335_65A3,
    0xA563_6365_399C_C36C,
    0x9A99_A6A5_66C9_A933,
    0x5A99_ACA9_A36A_5C3C,
    0xAA59_593A_5999_6533,
    0x53C6_595A_C99C_C93C,
    0x56A9_3965_3AA3_6C53,
    0x5396_A6C5_C5C9_6C53,
    0xA395_335A_963C_39A9,
    0x3966_33A5_6A95_553C,
    0x9695_9656_CCC3_5353,
    0x6C9C_3363_535A_9995,
    0x69A5_3593_AC96_39A6,
];

/// Odd primes multiplied into the mask during `squeeze`.
///
/// Each visible word gets its own multiplier, so repeated squeezes of different
/// positions within one round never share a linear relationship with raw state.
pub const EXPORT_PRIMES: [u64; 16] = [
    3, 7, 11, 19, 29, 37, 43, 53, 61, 71, 83, 97, 103, 109, 113, 127,
];

/// Odd multipliers for the confusion pass (64-bit mix constants).
pub const CONFUSION_MULTIPLIERS: [u64; 16] = [
    0x9E37_79B9_7F4A_7C15,
    0xBF58_476D_1CE4_E5B9,
    0x94D0_49BB_1331_11EB,
    0xFF51_AFD7_ED55_8CCD,
    0xC4CE_B9FE_1A85_EC53,
    0x2545_F491_4F6C_DD1D,
    0x5851_F42D_4C95_7F2D,
    0xD6E8_FEB8_6659_FD93,
    0xA24B_AED4_963E_E407,
    0x9FB2_1C65_1E98_DF25,
    0xC2B2_AE3D_27D4_EB4F,
    0x1656_67B1_E3D8_8D65,
    0x27D4_EB2F_1656_67C5,
    0x81DA_DEF4_BC2D_D44D,
    0xE703_7ED1_A0B4_28DB,
    0x589F_CB6D_5D1D_93A9,
];

/// Per-word rotation amounts used by both permutation families.
pub const ROTATIONS: [u32; 16] = [
    7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 5,
];

/// Round constants XOR'd into word 0 after each round to break fixed points.
pub const ROUND_CONSTANTS: [u64; 16] = [
    0x243F_6A88_85A3_08D3,
    0x1319_8A2E_0370_7344,
    0xA409_3822_299F_31D0,
    0x082E_FA98_EC4E_6C89,
    0x4528_21E6_38D0_1377,
    0xBE54_66CF_34E9_0C6C,
    0xC0AC_29B7_C97C_50DD,
    0x3F84_D5B5_B547_0917,
    0x9216_D5D9_8979_FB1B,
    0xD131_0BA6_98DF_B5AC,
    0x2FFD_72DB_D01A_DFB7,
    0xB8E1_AFED_6A26_7E96,
    0xBA7C_9045_F12C_7F99,
    0x24A1_9947_B391_6CF7,
    0x0801_F2E2_858E_FC16,
    0x6369_20D8_7157_4E69,
];

/// Golden-ratio multiplier used when folding confused words into the mask.
pub const MASK_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// True when every 4-bit nibble of `word` has exactly two set bits.
pub fn nibble_balanced(word: u64) -> bool {
    (0..16).all(|i| ((word >> (i * 4)) & 0xF).count_ones() == 2)
}
