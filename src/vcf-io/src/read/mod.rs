use std::{io::{BufRead, BufReader, Read}, path::Path, fs::File};

use flate2::read::MultiGzDecoder;
use gzp::{deflate::Bgzf, par::decompress::ParDecompressBuilder};
use log::trace;

use located_error::prelude::*;
use variant::{Symbols, VariantRecord};

use crate::header::{VcfHeader, COLUMNS_PREFIX};

mod error;
pub use error::VcfReaderError;

/// Streaming reader over a `.vcf`, or a BGZF/gzip-compressed `.vcf.gz` file.
///
/// The header is consumed at construction time. Records are then yielded lazily, in file order.
pub struct VcfReader<'a> {
    source : Box<dyn BufRead + 'a>,
    header : VcfHeader,
    symbols: Symbols,
    buf    : String,
    line_no: usize,
}

impl<'a> VcfReader<'a> {
    /// Open a `.vcf(.gz)` file.
    /// # Arguments:
    /// - `path`   : path leading to the `.vcf(.gz)` file.
    /// - `threads`: number of decompression threads (only relevant for BGZF compressed `.vcf.gz` files)
    /// - `symbols`: reserved imputed-md / missing allele symbols.
    pub fn new(path: &Path, threads: usize, symbols: Symbols) -> Result<VcfReader<'a>> {
        let loc_msg = || format!("While attempting to open {}", path.display());
        let reader = Self::get_reader(path, threads).with_loc(loc_msg)?;
        Self::from_reader(reader, symbols).with_loc(loc_msg)
    }

    /// Wrap any buffered reader. The header is parsed immediately.
    pub fn from_reader(mut source: Box<dyn BufRead + 'a>, symbols: Symbols) -> Result<VcfReader<'a>> {
        let header = Self::parse_header(&mut source).loc("While parsing VCF header")?;
        trace!("VCF header lists {} samples", header.samples().len());
        let line_no = header_len(&header);
        Ok(Self { source, header, symbols, buf: String::new(), line_no })
    }

    pub fn header(&self) -> &VcfHeader {
        &self.header
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    /// Read and parse the next record. Returns `Ok(None)` once EOF is reached.
    pub fn next_record(&mut self) -> Result<Option<VariantRecord>> {
        use VcfReaderError::{FillBuffer, ParseRecord, SampleCount};
        loop {
            self.buf.clear();
            let n = self.source.read_line(&mut self.buf).map_err(FillBuffer).loc("While reading VCF record")?;
            if n == 0 {
                return Ok(None)
            }
            self.line_no += 1;
            let line = self.buf.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue
            }

            let record = VariantRecord::parse(line, &self.symbols).map_err(|source| {
                let mut fields = line.split('\t');
                ParseRecord {
                    line : self.line_no,
                    chrom: fields.next().unwrap_or_default().to_string(),
                    pos  : fields.next().unwrap_or_default().to_string(),
                    source
                }
            }).loc("While parsing VCF record")?;

            let expected = self.header.samples().len();
            if record.n_samples() != expected {
                let found = record.n_samples();
                return Err(SampleCount{chrom: record.chrom, pos: record.pos, found, expected})
                    .loc("While parsing VCF record")
            }
            return Ok(Some(record))
        }
    }

    /// Check the file extension of the provided file, and return an appropriate BufReader
    /// - `.vcf` -> Return a default BufReader
    /// - `.gz`  -> Return a parallel BGZF decompressor/reader, or a multi-member gzip decoder if the file
    ///   lacks the BGZF `BC` extra subfield.
    fn get_reader(path: &Path, threads: usize) -> Result<Box<dyn BufRead>> {
        use VcfReaderError::{FillBuffer, InvalidFileExt, Open};
        let path_ext = path.extension().loc(InvalidFileExt)?;
        let vcf = File::open(path).map_err(Open).loc("While opening VCF")?;
        let source: Box<dyn Read> = match path_ext.to_str() {
            Some("vcf") => Box::new(vcf),
            Some("gz")  => {
                let mut vcf = BufReader::new(vcf);
                let bgzf = is_bgzf(vcf.fill_buf().map_err(FillBuffer).loc("While reading gzip header")?);
                trace!("{} is {} compressed", path.display(), if bgzf { "BGZF" } else { "gzip" });
                match bgzf {
                    true  => ParDecompressBuilder::<Bgzf>::new().maybe_num_threads(threads).maybe_par_from_reader(vcf),
                    false => Box::new(MultiGzDecoder::new(vcf)),
                }
            },
            _           => return loc!(InvalidFileExt)
        };
        Ok(Box::new(BufReader::new(source)))
    }

    /// Consume every `##` line, then the `#CHROM` line.
    fn parse_header(reader: &mut Box<dyn BufRead + 'a>) -> Result<VcfHeader> {
        use VcfReaderError::{FillBuffer, MissingHeader};
        let mut meta = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).map_err(FillBuffer).loc("While reading VCF header")? == 0 {
                return loc!(MissingHeader)
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.starts_with(COLUMNS_PREFIX) {
                return Ok(VcfHeader::new(meta, trimmed))
            } else if trimmed.starts_with("##") {
                meta.push(trimmed.to_string());
            } else if !trimmed.is_empty() {
                return loc!(MissingHeader)
            }
        }
    }
}

/// Check whether a gzip member header carries the BGZF `BC` extra subfield (RFC 1952 + SAM specification 4.1)
fn is_bgzf(header: &[u8]) -> bool {
    const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];
    const FEXTRA: u8 = 0x04;
    header.len() >= 16
        && header[..3] == GZIP_MAGIC
        && header[3] & FEXTRA != 0
        && header[12..14] == *b"BC"
        && header[14..16] == [2, 0]
}

fn header_len(header: &VcfHeader) -> usize {
    header.meta().len() + 1
}

impl Iterator for VcfReader<'_> {
    type Item = Result<VariantRecord>;
    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gzp::{par::compress::{ParCompress, ParCompressBuilder}, ZWriter};
    use std::io::Write;
    use variant::{Allele, Genotype};

    pub const FAKE_VCF: &str = "\
    ##fileformat=VCFv4.2\n\
    ##contig=<ID=seq1>\n\
    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tM1\tA1\tP1\n\
    seq1\t100\t.\tA\tT\t50\tPASS\tDP=50\tGT\t0/0\t0/1\t./.\n\
    seq1\t200\t.\tC\tG\t50\tPASS\tDP=20\tGT\t1|1\t99/99\t0/1\n\
    ";

    fn write_plain(dir: &Path, contents: &str) -> std::io::Result<std::path::PathBuf> {
        let path = dir.join("test.vcf");
        File::create(&path)?.write_all(contents.as_bytes())?;
        Ok(path)
    }

    #[test]
    fn read_plain_vcf() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = write_plain(tmpdir.path(), FAKE_VCF)?;
        let mut reader = VcfReader::new(&path, 0, Symbols::default())?;
        assert_eq!(reader.header().samples(), ["M1", "A1", "P1"]);

        let first = reader.next_record()?.expect("first record");
        assert_eq!(first.key(), "seq1:100");
        assert_eq!(*first.genotype(2)?, Genotype::MISSING);

        let second = reader.next_record()?.expect("second record");
        assert_eq!(*second.genotype(1)?, Genotype::IMPUTED);
        assert_eq!(*second.genotype(0)?, Genotype::new(Allele::ALT, Allele::ALT));
        assert!(reader.next_record()?.is_none());
        Ok(())
    }

    #[test]
    fn read_bgzf_vcf() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("test.vcf.gz");
        let mut parz: ParCompress<Bgzf> = ParCompressBuilder::new().from_writer(File::create(&path)?);
        parz.write_all(FAKE_VCF.as_bytes())?;
        parz.finish()?;

        let reader = VcfReader::new(&path, 1, Symbols::default())?;
        let keys = reader.map(|record| record.map(|r| r.key())).collect::<Result<Vec<_>>>()?;
        assert_eq!(keys, ["seq1:100", "seq1:200"]);
        Ok(())
    }

    #[test]
    fn read_gzip_vcf() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("test.vcf.gz");
        let mut gz = flate2::write::GzEncoder::new(File::create(&path)?, flate2::Compression::default());
        gz.write_all(FAKE_VCF.as_bytes())?;
        gz.finish()?;

        let reader = VcfReader::new(&path, 4, Symbols::default())?;
        assert_eq!(reader.header().samples(), ["M1", "A1", "P1"]);
        let keys = reader.map(|record| record.map(|r| r.key())).collect::<Result<Vec<_>>>()?;
        assert_eq!(keys, ["seq1:100", "seq1:200"]);
        Ok(())
    }

    #[test]
    fn bgzf_detection() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("test.vcf.gz");
        let mut parz: ParCompress<Bgzf> = ParCompressBuilder::new().from_writer(File::create(&path)?);
        parz.write_all(FAKE_VCF.as_bytes())?;
        parz.finish()?;
        assert!(is_bgzf(&std::fs::read(&path)?));

        let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        gz.write_all(FAKE_VCF.as_bytes())?;
        assert!(!is_bgzf(&gz.finish()?));
        assert!(!is_bgzf(FAKE_VCF.as_bytes()));
        assert!(!is_bgzf(&[]));
        Ok(())
    }

    #[test]
    fn invalid_extension() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("test.txt");
        File::create(&path)?.write_all(FAKE_VCF.as_bytes())?;
        assert!(VcfReader::new(&path, 0, Symbols::default()).is_err());
        Ok(())
    }

    #[test]
    fn missing_header() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = write_plain(tmpdir.path(), "##fileformat=VCFv4.2\nseq1\t1\t.\tA\tT\t.\t.\tDP=1\tGT\t0/0\n")?;
        assert!(VcfReader::new(&path, 0, Symbols::default()).is_err());
        Ok(())
    }

    #[test]
    fn sample_count_mismatch_names_the_record() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let contents = format!("{FAKE_VCF}seq1\t300\t.\tA\tT\t.\t.\tDP=1\tGT\t0/0\n");
        let path = write_plain(tmpdir.path(), &contents)?;
        let reader = VcfReader::new(&path, 0, Symbols::default())?;
        let err = reader.collect::<Result<Vec<_>>>().expect_err("third record lacks two samples");
        assert!(format!("{err:?}").contains("seq1:300"));
        Ok(())
    }

    #[test]
    fn unparseable_genotype_names_the_record() -> Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let contents = format!("{FAKE_VCF}seq2\t7\t.\tA\tT\t.\t.\tDP=1\tGT\t0/0\t0-1\t0/0\n");
        let path = write_plain(tmpdir.path(), &contents)?;
        let reader = VcfReader::new(&path, 0, Symbols::default())?;
        let err = reader.collect::<Result<Vec<_>>>().expect_err("'0-1' is not a genotype");
        assert!(format!("{err:?}").contains("seq2:7"));
        Ok(())
    }
}
