//! Chrysler/Jeep model identifiers, reference signatures and message layout

use crate::fingerprint::FingerprintTable;
use crate::types::Signature;

pub const PACIFICA_2017_HYBRID: &str = "CHRYSLER PACIFICA HYBRID 2017";
pub const PACIFICA_2018_HYBRID: &str = "CHRYSLER PACIFICA HYBRID 2018";
pub const PACIFICA_2019_HYBRID: &str = "CHRYSLER PACIFICA HYBRID 2019";
pub const PACIFICA_2018: &str = "CHRYSLER PACIFICA 2018";
pub const JEEP_CHEROKEE: &str = "JEEP GRAND CHEROKEE V6 2018";
pub const JEEP_CHEROKEE_2019: &str = "JEEP GRAND CHEROKEE 2019";

/// Every model served by this family
pub const CARS: &[&str] = &[
    PACIFICA_2017_HYBRID,
    PACIFICA_2018_HYBRID,
    PACIFICA_2019_HYBRID,
    PACIFICA_2018,
    JEEP_CHEROKEE,
    JEEP_CHEROKEE_2019,
];

pub const ADDR_WHEEL_BUTTONS: u32 = 0x23b;
pub const ADDR_LKAS_COMMAND: u32 = 0x292;
pub const ADDR_LKAS_HUD: u32 = 0x2a6;
pub const ADDR_CHIME: u32 = 0x339;

/// Steering torque command limit, raw units
pub const STEER_MAX: i32 = 261;

/// Message names of the path/steering telemetry frames
pub const PATH_POLY_FRONT: &str = "OPENPILOT_PATH_POLY_FRONT";
pub const PATH_POLY_BACK: &str = "OPENPILOT_PATH_POLY_BACK";
pub const STEERING_ANGLE: &str = "OPENPILOT_STEERING_ANGLE";

/// Captured bus signature of a Pacifica Hybrid 2018
pub const PACIFICA_2018_HYBRID_SIGNATURE: &[(u32, usize)] = &[
    (68, 8), (257, 5), (258, 8), (264, 8), (268, 8), (270, 8), (274, 2), (280, 8), (284, 8),
    (288, 7), (290, 6), (291, 8), (292, 8), (294, 8), (300, 8), (308, 8), (320, 8), (324, 8),
    (331, 8), (332, 8), (344, 8), (368, 8), (376, 3), (384, 8), (388, 4), (448, 6), (456, 4),
    (464, 8), (469, 8), (480, 8), (500, 8), (501, 8), (512, 8), (514, 8), (520, 8), (528, 8),
    (532, 8), (544, 8), (557, 8), (559, 8), (560, 4), (564, 8), (571, 3), (579, 8), (584, 8),
    (608, 8), (624, 8), (625, 8), (632, 8), (639, 8), (653, 8), (654, 8), (655, 8), (660, 8),
    (669, 3), (671, 8), (672, 8), (680, 8), (701, 8), (704, 8), (705, 8), (706, 8), (709, 8),
    (710, 8), (719, 8), (720, 6), (736, 8), (737, 8), (746, 5), (760, 8), (764, 8), (766, 8),
    (770, 8), (773, 8), (779, 8), (782, 8), (784, 8), (792, 8), (799, 8), (800, 8), (804, 8),
    (816, 8), (817, 8), (820, 8), (825, 2), (826, 8), (832, 8), (838, 2), (848, 8), (853, 8),
    (856, 4), (860, 6), (863, 8), (878, 8), (882, 8), (897, 8), (908, 8), (924, 8), (926, 3),
    (929, 8), (937, 8), (938, 8), (939, 8), (940, 8), (941, 8), (942, 8), (943, 8), (947, 8),
    (948, 8), (958, 8), (959, 8), (969, 4), (974, 5), (979, 8), (980, 8), (981, 8), (982, 8),
    (983, 8), (984, 8), (992, 8), (993, 7), (995, 8), (996, 8), (1000, 8), (1001, 8),
    (1002, 8), (1003, 8), (1008, 8), (1009, 8), (1010, 8), (1011, 8), (1012, 8), (1013, 8),
    (1014, 8), (1015, 8), (1024, 8), (1025, 8), (1026, 8), (1031, 8), (1033, 8), (1050, 8),
    (1059, 8), (1082, 8), (1083, 8), (1098, 8), (1100, 8),
];

/// Reference signatures known for this family.
///
/// Only the Pacifica Hybrid 2018 signature was captured, so it is the only
/// built-in entry. The other models in [`CARS`] are recognised once a table
/// naming them is merged in with [`FingerprintTable::from_json_file`] (the
/// CLI `--table` option).
pub fn fingerprints() -> FingerprintTable {
    FingerprintTable::new().with_signature(
        PACIFICA_2018_HYBRID,
        PACIFICA_2018_HYBRID_SIGNATURE.iter().copied().collect::<Signature>(),
    )
}

/// Layout of the messages this family sends or reads back
pub const DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: XXX EPS CAM

BO_ 571 WHEEL_BUTTONS: 3 XXX
 SG_ ACC_CANCEL : 0|1@0+ (1,0) [0|1] "" XXX
 SG_ COUNTER : 15|4@0+ (1,0) [0|15] "" XXX
 SG_ CHECKSUM : 23|8@0+ (1,0) [0|255] "" XXX

BO_ 658 LKAS_COMMAND: 6 CAM
 SG_ LKAS_STEERING_TORQUE : 7|11@0+ (1,-1024) [-1024|1023] "" EPS
 SG_ LKAS_HIGH_TORQUE : 12|1@0+ (1,0) [0|1] "" EPS
 SG_ COUNTER : 31|4@0+ (1,0) [0|15] "" EPS
 SG_ CHECKSUM : 47|8@0+ (1,0) [0|255] "" EPS

BO_ 678 LKAS_HUD: 8 CAM
 SG_ LKAS_ICON_COLOR : 1|2@0+ (1,0) [0|3] "" XXX
 SG_ CAR_MODEL : 15|8@0+ (1,0) [0|255] "" XXX
 SG_ LKAS_LANE_LINES : 19|4@0+ (1,0) [0|15] "" XXX
 SG_ LKAS_ALERTS : 27|4@0+ (1,0) [0|15] "" XXX

BO_ 825 CHIME: 2 XXX
 SG_ CHIME : 7|8@0+ (1,0) [0|255] "" XXX
 SG_ CHIME_TONE : 15|8@0+ (1,0) [0|255] "" XXX

BO_ 1264 OPENPILOT_PATH_POLY_FRONT: 8 XXX
 SG_ PROB : 7|8@0+ (1,0) [0|255] "" XXX
 SG_ THIRD_ORDER_SIGN : 15|1@0+ (1,0) [0|1] "" XXX
 SG_ THIRD_ORDER : 14|23@0+ (1,0) [0|8388607] "" XXX
 SG_ SECOND_ORDER_SIGN : 39|1@0+ (1,0) [0|1] "" XXX
 SG_ SECOND_ORDER : 38|23@0+ (1,0) [0|8388607] "" XXX
 SG_ COUNTER : 63|8@0+ (1,0) [0|255] "" XXX

BO_ 1265 OPENPILOT_PATH_POLY_BACK: 8 XXX
 SG_ FIRST_ORDER_SIGN : 7|1@0+ (1,0) [0|1] "" XXX
 SG_ FIRST_ORDER : 6|23@0+ (1,0) [0|8388607] "" XXX
 SG_ ZERO_ORDER_SIGN : 31|1@0+ (1,0) [0|1] "" XXX
 SG_ ZERO_ORDER : 30|23@0+ (1,0) [0|8388607] "" XXX
 SG_ COUNTER : 63|8@0+ (1,0) [0|255] "" XXX

BO_ 1266 OPENPILOT_STEERING_ANGLE: 8 XXX
 SG_ STEERING_ANGLE_SIGN : 7|1@0+ (1,0) [0|1] "" XXX
 SG_ STEERING_ANGLE : 6|23@0+ (1,0) [0|8388607] "" XXX
 SG_ STEERING_ANGLE_TARGET_SIGN : 31|1@0+ (1,0) [0|1] "" XXX
 SG_ STEERING_ANGLE_TARGET : 30|23@0+ (1,0) [0|8388607] "" XXX
 SG_ COUNTER : 63|8@0+ (1,0) [0|255] "" XXX
"#;
