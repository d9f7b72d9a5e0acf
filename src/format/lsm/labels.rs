//! Human-readable labels for scan-information entry codes.
//!
//! Only labeled entries are published as metadata; everything else is kept
//! in the record's attribute map but not shown.

/// Entry code to label, sorted by code.
static LABELS: &[(u32, &str)] = &[
    (0x10000001, "Name"),
    (0x10000002, "Description"),
    (0x10000003, "Notes"),
    (0x10000004, "Objective"),
    (0x10000005, "Processing Summary"),
    (0x10000006, "Special Scan Mode"),
    (0x10000007, "Scan Type"),
    (0x10000008, "Scan Mode"),
    (0x10000009, "Number of Stacks"),
    (0x1000000A, "Lines Per Plane"),
    (0x1000000B, "Samples Per Line"),
    (0x1000000C, "Planes Per Volume"),
    (0x1000000D, "Images Width"),
    (0x1000000E, "Images Height"),
    (0x1000000F, "Number of Planes"),
    (0x10000010, "Number of Stacks"),
    (0x10000011, "Number of Channels"),
    (0x10000012, "Linescan XY Size"),
    (0x10000013, "Scan Direction"),
    (0x10000014, "Time Series"),
    (0x10000015, "Original Scan Data"),
    (0x10000016, "Zoom X"),
    (0x10000017, "Zoom Y"),
    (0x10000018, "Zoom Z"),
    (0x10000019, "Sample 0X"),
    (0x1000001A, "Sample 0Y"),
    (0x1000001B, "Sample 0Z"),
    (0x1000001C, "Sample Spacing"),
    (0x1000001D, "Line Spacing"),
    (0x1000001E, "Plane Spacing"),
    (0x1000001F, "Plane Width"),
    (0x10000020, "Plane Height"),
    (0x10000021, "Volume Depth"),
    (0x10000034, "Rotation"),
    (0x10000035, "Precession"),
    (0x10000036, "Sample 0Time"),
    (0x10000037, "Start Scan Trigger In"),
    (0x10000038, "Start Scan Trigger Out"),
    (0x10000039, "Start Scan Event"),
    (0x10000040, "Start Scan Time"),
    (0x10000041, "Stop Scan Trigger In"),
    (0x10000042, "Stop Scan Trigger Out"),
    (0x10000043, "Stop Scan Event"),
    (0x10000044, "Stop Scan Time"),
    (0x10000045, "Use ROIs"),
    (0x10000046, "Use Reduced Memory ROIs"),
    (0x10000047, "User"),
    (0x10000048, "Use B/C Correction"),
    (0x10000049, "Position B/C Contrast 1"),
    (0x10000050, "Position B/C Contrast 2"),
    (0x10000051, "Interpolation Y"),
    (0x10000052, "Camera Binning"),
    (0x10000053, "Camera Supersampling"),
    (0x10000054, "Camera Frame Width"),
    (0x10000055, "Camera Frame Height"),
    (0x10000056, "Camera Offset X"),
    (0x10000057, "Camera Offset Y"),
    (0x12000001, "Name"),
    (0x12000003, "Interval"),
    (0x12000004, "Trigger In"),
    (0x12000005, "Trigger Out"),
    (0x14000001, "Name"),
    (0x14000002, "Description"),
    (0x14000003, "Trigger In"),
    (0x14000004, "Trigger Out"),
    (0x40000001, "Multiplex Type"),
    (0x40000002, "Multiplex Order"),
    (0x40000003, "Sampling Mode"),
    (0x40000004, "Sampling Method"),
    (0x40000005, "Sampling Number"),
    (0x40000006, "Acquire"),
    (0x40000007, "Sample Observation Time"),
    (0x40000008, "Time Between Stacks"),
    (0x4000000C, "Name"),
    (0x4000000D, "Collimator 1 Name"),
    (0x4000000E, "Collimator 1 Position"),
    (0x4000000F, "Collimator 2 Name"),
    (0x40000010, "Collimator 2 Position"),
    (0x40000011, "Is Bleach Track"),
    (0x40000012, "Bleach After Scan Number"),
    (0x40000013, "Bleach Scan Number"),
    (0x40000014, "Trigger In"),
    (0x40000015, "Trigger Out"),
    (0x40000016, "Is Ratio Track"),
    (0x40000017, "Bleach Count"),
    (0x40000018, "SPI Center Wavelength"),
    (0x40000019, "Pixel Time"),
    (0x40000020, "ID Condensor Frontlens"),
    (0x40000021, "Condensor Frontlens"),
    (0x40000022, "ID Field Stop"),
    (0x40000023, "Field Stop Value"),
    (0x40000024, "ID Condensor Aperture"),
    (0x40000025, "Condensor Aperture"),
    (0x40000026, "ID Condensor Revolver"),
    (0x40000027, "Condensor Revolver"),
    (0x40000028, "ID Transmission Filter 1"),
    (0x40000029, "ID Transmission 1"),
    (0x40000030, "ID Transmission Filter 2"),
    (0x40000031, "ID Transmission 2"),
    (0x40000032, "Repeat Bleach"),
    (0x40000033, "Enable Spot Bleach Pos"),
    (0x40000034, "Spot Bleach Position X"),
    (0x40000035, "Spot Bleach Position Y"),
    (0x40000036, "Bleach Position Z"),
    (0x50000001, "Name"),
    (0x50000002, "Acquire"),
    (0x50000003, "Power"),
    (0x70000003, "Detector Gain"),
    (0x70000005, "Amplifier Gain"),
    (0x70000007, "Amplifier Offset"),
    (0x70000009, "Pinhole Diameter"),
    (0x7000000B, "Acquire"),
    (0x7000000C, "Detector Name"),
    (0x7000000D, "Amplifier Name"),
    (0x7000000E, "Pinhole Name"),
    (0x7000000F, "Filter Set Name"),
    (0x70000010, "Filter Name"),
    (0x70000013, "Integrator Name"),
    (0x70000014, "Detection Channel Name"),
    (0x70000015, "Detector Gain B/C 1"),
    (0x70000016, "Detector Gain B/C 2"),
    (0x70000017, "Amplifier Gain B/C 1"),
    (0x70000018, "Amplifier Gain B/C 2"),
    (0x70000019, "Amplifier Offset B/C 1"),
    (0x70000020, "Amplifier Offset B/C 2"),
    (0x70000021, "Spectral Scan Channels"),
    (0x70000022, "SPI Wavelength Start"),
    (0x70000023, "SPI Wavelength End"),
    (0x70000026, "Dye Name"),
    (0x70000027, "Dye Folder"),
    (0x90000001, "Name"),
    (0x90000002, "Power"),
    (0x90000003, "Wavelength"),
    (0x90000004, "Acquire"),
    (0x90000005, "Detection Channel Name"),
    (0x90000006, "Power B/C 1"),
    (0x90000007, "Power B/C 2"),
    (0xB0000001, "Filter Set"),
    (0xB0000002, "Filter"),
    (0xB0000003, "Name"),
    (0xD0000001, "Name"),
    (0xD0000004, "Color"),
    (0xD0000005, "Sample Type"),
    (0xD0000006, "Bits Per Sample"),
    (0xD0000007, "Ratio Type"),
    (0xD0000008, "Ratio Track 1"),
    (0xD0000009, "Ratio Track 2"),
    (0xD000000A, "Ratio Channel 1"),
    (0xD000000B, "Ratio Channel 2"),
    (0xD000000C, "Ratio Const. 1"),
    (0xD000000D, "Ratio Const. 2"),
    (0xD000000E, "Ratio Const. 3"),
    (0xD000000F, "Ratio Const. 4"),
    (0xD0000010, "Ratio Const. 5"),
    (0xD0000011, "Ratio Const. 6"),
    (0xD0000012, "Ratio First Images 1"),
    (0xD0000013, "Ratio First Images 2"),
    (0xD0000014, "Dye Name"),
    (0xD0000015, "Dye Folder"),
    (0xD0000016, "Spectrum"),
    (0xD0000017, "Acquire"),
];

/// Look up the label for an entry code.
pub fn label_for(code: u32) -> Option<&'static str> {
    LABELS
        .binary_search_by_key(&code, |&(c, _)| c)
        .ok()
        .map(|i| LABELS[i].1)
}
