#[macro_export]
macro_rules! test_consensus_type {
    ($struct_name:ident) => {
        paste::paste! {
            #[cfg(test)]
            #[allow(non_snake_case)]
            mod [<tests_ $struct_name>] {
                use super::*;
                use rstest::rstest;
                use serde_yaml::Value;
                use snap::raw::Decoder;
                use std::str::FromStr;
                use tree_hash::TreeHash;
                use ssz::Decode;
                use ssz::Encode;

                #[rstest]
                #[case("case_0")]
                #[case("case_1")]
                #[case("case_2")]
                #[case("case_3")]
                #[case("case_4")]
                fn test_type(#[case] case: &str) {
                    let path = format!(
                        "mainnet/tests/mainnet/phase0/ssz_static/{}/ssz_random/{case}/",
                        stringify!($struct_name)
                    );

                    // Read and parse hash root
                    let hash_root = {
                        let hash_root_content = std::fs::read_to_string(format!("{path}roots.yaml"))
                            .expect("cannot find test asset");
                        let value: Value = serde_yaml::from_str(&hash_root_content).unwrap();
                        alloy_primitives::B256::from_str(value.get("root").unwrap().as_str().unwrap())
                            .unwrap()
                    };

                    // Deserialize the struct
                    let content = {
                        let value = std::fs::read_to_string(format!("{path}value.yaml"))
                            .expect("cannot find test asset");
                        serde_yaml::from_str::<$struct_name>(&value).unwrap()
                    };

                    // Read and decompress SSZ snappy file
                    let ssz_snappy = std::fs::read(format!("{path}serialized.ssz_snappy")).expect("cannot find test asset");
                    let mut decoder = Decoder::new();
                    let ssz = decoder.decompress_vec(&ssz_snappy).unwrap();

                    // Perform the assertions
                    assert_eq!(ssz, content.as_ssz_bytes());
                    assert_eq!(content, $struct_name::from_ssz_bytes(&ssz).unwrap());
                    assert_eq!(hash_root, content.tree_hash_root());
                }
            }
        }
    };
}

/// Run every ``pyspec_tests`` case of a phase0 block operation. ``$processor`` receives the
/// mainnet config, the pre state and the decoded operation; the state must match ``post`` when
/// the case carries one and the processor must fail otherwise.
#[macro_export]
macro_rules! test_operation {
    ($operation:ident, $input:ty, $input_file:literal, $processor:expr) => {
        paste::paste! {
            #[test]
            fn [<test_operation_ $operation>]() {
                let base_path = format!(
                    "mainnet/tests/mainnet/phase0/operations/{}/pyspec_tests",
                    stringify!($operation)
                );
                let config = beacon_consensus::config::Config::mainnet();

                for entry in std::fs::read_dir(&base_path).expect("cannot find test asset") {
                    let case_dir = entry.expect("cannot read test case").path();

                    let mut state: beacon_consensus::phase0::beacon_state::BeaconState =
                        $crate::utils::read_ssz_snappy(&case_dir.join("pre.ssz_snappy"))
                            .expect("cannot read pre state");
                    let input: $input = $crate::utils::read_ssz_snappy(
                        &case_dir.join(concat!($input_file, ".ssz_snappy")),
                    )
                    .expect("cannot read operation");
                    let expected_post: Option<beacon_consensus::phase0::beacon_state::BeaconState> =
                        $crate::utils::read_ssz_snappy(&case_dir.join("post.ssz_snappy"));

                    let result = ($processor)(&config, &mut state, &input);

                    match expected_post {
                        Some(post) => {
                            assert!(result.is_ok(), "{case_dir:?} rejected: {:?}", result.err());
                            assert_eq!(state, post, "{case_dir:?} post state mismatch");
                        }
                        None => assert!(result.is_err(), "{case_dir:?} must be rejected"),
                    }
                }
            }
        }
    };
}
