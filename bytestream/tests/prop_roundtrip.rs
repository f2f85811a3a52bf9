use bytestream::{ByteError, ByteReader, ByteWriter};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    U8(u8),
    I8(i8),
    U16(u16),
    U32(u32),
    F32(f32),
    Bytes(Vec<u8>),
}

impl Op {
    fn len(&self) -> usize {
        match self {
            Self::U8(_) | Self::I8(_) => 1,
            Self::U16(_) => 2,
            Self::U32(_) | Self::F32(_) => 4,
            Self::Bytes(bytes) => bytes.len(),
        }
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::U8),
        any::<i8>().prop_map(Op::I8),
        any::<u16>().prop_map(Op::U16),
        any::<u32>().prop_map(Op::U32),
        (-1.0e6f32..1.0e6).prop_map(Op::F32),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Op::Bytes),
    ]
}

fn write_op(writer: &mut ByteWriter<'_>, op: &Op) -> Result<(), ByteError> {
    match op {
        Op::U8(v) => writer.write_u8(*v),
        Op::I8(v) => writer.write_i8(*v),
        Op::U16(v) => writer.write_u16(*v),
        Op::U32(v) => writer.write_u32(*v),
        Op::F32(v) => writer.write_f32(*v),
        Op::Bytes(bytes) => writer.write_bytes(bytes),
    }
}

proptest! {
    #[test]
    fn prop_roundtrip_ops(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let total: usize = ops.iter().map(Op::len).sum();
        let mut buf = vec![0u8; total];
        let mut writer = ByteWriter::new(&mut buf);
        for op in &ops {
            write_op(&mut writer, op).unwrap();
        }
        prop_assert_eq!(writer.finish(), total);

        let mut reader = ByteReader::new(&buf);
        for op in &ops {
            match op {
                Op::U8(v) => prop_assert_eq!(reader.read_u8().unwrap(), *v),
                Op::I8(v) => prop_assert_eq!(reader.read_i8().unwrap(), *v),
                Op::U16(v) => prop_assert_eq!(reader.read_u16().unwrap(), *v),
                Op::U32(v) => prop_assert_eq!(reader.read_u32().unwrap(), *v),
                Op::F32(v) => prop_assert_eq!(reader.read_f32().unwrap().to_bits(), v.to_bits()),
                Op::Bytes(bytes) => prop_assert_eq!(reader.read_bytes(bytes.len()).unwrap(), bytes.as_slice()),
            }
        }
        prop_assert!(reader.is_empty());
    }

    #[test]
    fn prop_writer_never_exceeds_capacity(
        ops in prop::collection::vec(op_strategy(), 1..64),
        capacity in 0usize..64,
    ) {
        let mut buf = vec![0u8; capacity];
        let mut writer = ByteWriter::new(&mut buf);
        for op in &ops {
            let before = writer.position();
            if write_op(&mut writer, op).is_err() {
                prop_assert_eq!(writer.position(), before);
            }
            prop_assert!(writer.position() <= capacity);
        }
    }

    #[test]
    fn prop_reader_never_panics(data in prop::collection::vec(any::<u8>(), 0..32), lens in prop::collection::vec(0usize..8, 0..16)) {
        let mut reader = ByteReader::new(&data);
        for len in lens {
            let _ = reader.read_bytes(len);
            let _ = reader.read_u16();
        }
        prop_assert!(reader.position() <= data.len());
    }
}
